//! Projector Core - traversal and projection kernel
//!
//! This crate turns rows of a relational entity graph into rendered
//! documents, including:
//! - The explicit edge table built from a model description
//! - The row source contract and an in-memory source
//! - A Jinja-compatible template registry keyed by class name
//! - Study and subject traversal with per-role blacklists
//! - Bucket maps and the buffered JSON-array document sink
//!
//! Storage backends and the run driver live in `projector-store` and
//! `projector-engine`.

pub use projector_core_types as types;

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod render;
pub mod sink;
pub mod source;
pub mod templates;
pub mod traversal;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, ProjectionError, Result};
pub use model::{Edge, Instance, ModelSchema};
pub use render::{build_bindings, Bindings};
pub use sink::{BucketRouter, BufferedArraySink, DocumentConsumer};
pub use source::{MemorySource, RowSource};
pub use templates::TemplateRegistry;
pub use traversal::{AnchorRole, AnchorSettings, AnchorSpec, BucketMap, Projector};
