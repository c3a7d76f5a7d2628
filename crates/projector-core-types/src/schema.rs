//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Projection identifiers
pub const FIELD_CLASS: &str = "class";
pub const FIELD_FIELD: &str = "field";
pub const FIELD_BUCKET: &str = "bucket";
pub const FIELD_ROLE: &str = "role";
pub const FIELD_PATH: &str = "path";

// Counters
pub const FIELD_DOCUMENTS: &str = "documents";
pub const FIELD_STUDIES: &str = "studies";
pub const FIELD_SUBJECTS: &str = "subjects";
pub const FIELD_RENDER_FAILURES: &str = "render_failures";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
