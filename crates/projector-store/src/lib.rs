//! Projector Store - SQLite row source and model loading
//!
//! Provides:
//! - Connection helpers (open, in-memory, attach)
//! - Model description loading with an explicit table-rewrite pass
//! - `SqliteSource`, a `RowSource` with keyset-paginated streaming

pub mod db;
pub mod errors;
pub mod model_loader;
pub mod sqlite_source;

// Re-export key types
pub use errors::Result;
pub use model_loader::{apply_table_rewrite, load_model};
pub use sqlite_source::SqliteSource;
