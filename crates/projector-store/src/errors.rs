//! Error handling for projector-store
//!
//! Wraps projector-core ExError with store-specific helpers

use projector_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a database error attributed to one entity class
pub fn query_failed(class_name: &str, err: rusqlite::Error) -> ExError {
    from_rusqlite(err).with_class(class_name)
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an error for a class the model does not declare
pub fn unknown_class(class_name: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("sqlite_source")
        .with_class(class_name)
        .with_message("Class is not declared in the model")
}
