//! Model description loading
//!
//! The model file is parsed into an edge table once; physical table names
//! are then adjusted by an explicit rewrite pass rather than at class
//! definition time.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use projector_core::errors::ExError;
use projector_core::model::{ModelSchema, TableRewrite};
use std::path::Path;

/// Load and validate a YAML model description
///
/// # Errors
///
/// `Io` if the file cannot be read, `Serialization` for malformed YAML,
/// `InvalidModel` for an inconsistent edge table.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelSchema> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| io_error("load_model", e).with_path(path))?;
    let model = ModelSchema::from_yaml_str(&content)
        .map_err(|e| ExError::from(e).with_op("load_model").with_path(path))?;
    tracing::info!(
        path = %path.display(),
        classes = model.classes().count(),
        "Loaded model description"
    );
    Ok(model)
}

/// Rename every class and association table according to `rewrite`
pub fn apply_table_rewrite(model: &mut ModelSchema, rewrite: &TableRewrite) {
    for (original, renamed) in model.rewrite_tables(rewrite) {
        tracing::info!(
            table = %original,
            renamed = %renamed,
            schema = rewrite.schema.as_deref().unwrap_or(""),
            "Rewrote table name"
        );
    }
}
