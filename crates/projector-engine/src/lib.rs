//! Projector Engine - Orchestration layer
//!
//! Provides the project configuration, the run driver that walks studies
//! then subjects, and the writers that persist the resulting buckets.

pub mod config;
pub mod driver;
pub mod output;
pub mod project;

pub use config::{ConfigOverrides, OutputLayout, OutputSettings, ProjectConfig};
pub use driver::{run_projection, stream_projection, RunOutcome, RunSummary};
pub use output::{open_consumer, write_buckets};
pub use project::{load_project_model, Project};
