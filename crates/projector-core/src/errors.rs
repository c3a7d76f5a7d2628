use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ProjectionError
pub type Result<T> = std::result::Result<T, ProjectionError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and the CLI's exit diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    Configuration,
    NotFound,
    InvalidModel,

    // Projection
    MissingTemplate,
    Render,
    AnchorUnresolved,

    // Sink
    SinkIo,
    SinkClosed,

    // Integration/IO
    Persistence,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidModel => "ERR_INVALID_MODEL",
            ExErrorKind::MissingTemplate => "ERR_MISSING_TEMPLATE",
            ExErrorKind::Render => "ERR_RENDER",
            ExErrorKind::AnchorUnresolved => "ERR_ANCHOR_UNRESOLVED",
            ExErrorKind::SinkIo => "ERR_SINK_IO",
            ExErrorKind::SinkClosed => "ERR_SINK_CLOSED",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling plus the
/// projection context (class, bucket, destination path, binding keys)
/// needed to diagnose a failed run.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    class_name: Option<String>,
    bucket: Option<String>,
    path: Option<PathBuf>,
    binding_keys: Option<Vec<String>>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            class_name: None,
            bucket: None,
            path: None,
            binding_keys: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity class context
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Add bucket context
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Add file or directory context
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add the binding names that were handed to the template engine
    pub fn with_binding_keys(mut self, keys: Vec<String>) -> Self {
        self.binding_keys = Some(keys);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub fn binding_keys(&self) -> Option<&[String]> {
        self.binding_keys.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(class_name) = &self.class_name {
            write!(f, " (class: {})", class_name)?;
        }
        if let Some(bucket) = &self.bucket {
            write!(f, " (bucket: {})", bucket)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for projection operations
#[derive(Error, Debug, Clone)]
pub enum ProjectionError {
    // ===== Configuration Errors =====
    /// Template directory does not exist
    #[error("Template directory not found: {}", .path.display())]
    TemplateDirNotFound { path: PathBuf },

    /// Any other configuration problem detected before traversal starts
    #[error("Configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// Model description is inconsistent (unknown targets, duplicate fields)
    #[error("Invalid model: {reason}")]
    InvalidModel { reason: String },

    /// Class name not declared in the model
    #[error("Unknown entity class: '{class_name}'")]
    UnknownClass { class_name: String },

    // ===== Projection Errors =====
    /// No template registered for the class
    #[error("No template found for class: '{class_name}'")]
    MissingTemplate { class_name: String },

    /// Template engine failed (undefined binding or template logic fault)
    #[error("Failed to render '{class_name}' with bindings [{}]: {message}", .binding_keys.join(", "))]
    RenderError {
        class_name: String,
        binding_keys: Vec<String>,
        message: String,
    },

    /// Subject whose study anchor cannot be determined
    #[error("Cannot resolve study for {subject}: {reason}")]
    AnchorUnresolved { subject: String, reason: String },

    // ===== Sink Errors =====
    /// Output file could not be created or written
    #[error("Sink I/O error on {}: {message}", .path.display())]
    SinkIo { path: PathBuf, message: String },

    /// Document handed to a sink that was already closed
    #[error("Sink for {} is already closed", .path.display())]
    SinkClosed { path: PathBuf },

    // ===== Collaborator Errors =====
    /// Failure reported by the row source
    #[error("Row source failure: {0}")]
    RowSource(ExError),

    /// Serialization error (JSON/YAML encoding or decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl ProjectionError {
    /// Classify this error without consuming it
    pub fn kind(&self) -> ExErrorKind {
        match self {
            ProjectionError::TemplateDirNotFound { .. } => ExErrorKind::Configuration,
            ProjectionError::ConfigurationError { .. } => ExErrorKind::Configuration,
            ProjectionError::InvalidModel { .. } => ExErrorKind::InvalidModel,
            ProjectionError::UnknownClass { .. } => ExErrorKind::NotFound,
            ProjectionError::MissingTemplate { .. } => ExErrorKind::MissingTemplate,
            ProjectionError::RenderError { .. } => ExErrorKind::Render,
            ProjectionError::AnchorUnresolved { .. } => ExErrorKind::AnchorUnresolved,
            ProjectionError::SinkIo { .. } => ExErrorKind::SinkIo,
            ProjectionError::SinkClosed { .. } => ExErrorKind::SinkClosed,
            ProjectionError::RowSource(inner) => inner.kind(),
            ProjectionError::Serialization { .. } => ExErrorKind::Serialization,
        }
    }
}

/// Conversion from ProjectionError to ExError
impl From<ProjectionError> for ExError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::TemplateDirNotFound { path } => {
                ExError::new(ExErrorKind::Configuration)
                    .with_op("load_templates")
                    .with_path(path)
                    .with_message("Template directory does not exist")
            }

            ProjectionError::ConfigurationError { reason } => {
                ExError::new(ExErrorKind::Configuration).with_message(reason)
            }

            ProjectionError::InvalidModel { reason } => {
                ExError::new(ExErrorKind::InvalidModel)
                    .with_op("load_model")
                    .with_message(reason)
            }

            ProjectionError::UnknownClass { class_name } => ExError::new(ExErrorKind::NotFound)
                .with_class(class_name)
                .with_message("Class is not declared in the model"),

            ProjectionError::MissingTemplate { class_name } => {
                ExError::new(ExErrorKind::MissingTemplate)
                    .with_class(class_name)
                    .with_message("No template found for class")
            }

            ProjectionError::RenderError {
                class_name,
                binding_keys,
                message,
            } => ExError::new(ExErrorKind::Render)
                .with_op("render")
                .with_class(class_name)
                .with_binding_keys(binding_keys)
                .with_message(message),

            ProjectionError::AnchorUnresolved { subject, reason } => {
                ExError::new(ExErrorKind::AnchorUnresolved)
                    .with_op("resolve_study")
                    .with_message(format!("{}: {}", subject, reason))
            }

            ProjectionError::SinkIo { path, message } => ExError::new(ExErrorKind::SinkIo)
                .with_op("sink_flush")
                .with_path(path)
                .with_message(message),

            ProjectionError::SinkClosed { path } => ExError::new(ExErrorKind::SinkClosed)
                .with_op("sink_accept")
                .with_path(path)
                .with_message("Document accepted after close"),

            ProjectionError::RowSource(inner) => inner,

            ProjectionError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<ExError> for ProjectionError {
    fn from(err: ExError) -> Self {
        ProjectionError::RowSource(err)
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ProjectionError {
    fn from(err: serde_yaml::Error) -> Self {
        ProjectionError::Serialization {
            message: err.to_string(),
        }
    }
}
