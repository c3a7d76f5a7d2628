//! Canonical logging macros
//!
//! Every operation boundary emits exactly one `start` and one `end` (or
//! `end_error`) event carrying the `component` and `op` fields.

use crate::errors::{ExError, ExErrorKind, ProjectionError};

/// Anything that can be classified for the `err_kind` / `err_code` fields
pub trait Classify {
    fn error_kind(&self) -> ExErrorKind;
}

impl Classify for ExError {
    fn error_kind(&self) -> ExErrorKind {
        self.kind()
    }
}

impl Classify for ProjectionError {
    fn error_kind(&self) -> ExErrorKind {
        self.kind()
    }
}

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use projector_core::log_op_start;
/// log_op_start!("project_study");
/// log_op_start!("project_study", class = "Study");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use projector_core::log_op_end;
/// log_op_end!("project_study", duration_ms = 42);
/// log_op_end!("project_study", duration_ms = 42, documents = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is borrowed; it only needs to implement
/// [`Classify`](crate::logging_facility::macros::Classify).
///
/// # Example
///
/// ```
/// # use projector_core::log_op_error;
/// # use projector_core::errors::ProjectionError;
/// let err = ProjectionError::MissingTemplate { class_name: "Study".to_string() };
/// log_op_error!("project_study", &err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::logging_facility::macros::Classify as _;
        let kind = ($err).error_kind();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?kind,
            err_code = kind.code(),
            error = %$err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::logging_facility::macros::Classify as _;
        let kind = ($err).error_kind();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?kind,
            err_code = kind.code(),
            error = %$err,
            $($field)*
        );
    }};
}
