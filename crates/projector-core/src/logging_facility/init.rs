//! Logging initialization module

use crate::errors::{ProjectionError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

/// Everything `init` needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub profile: Profile,
    /// Default level for the projector crates when `RUST_LOG` is unset
    pub level: Option<String>,
    /// Mirror every event into this file (parent directories are created)
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            level: None,
            file: None,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> String {
        let level = match (&self.level, self.profile) {
            (Some(level), _) => level.as_str(),
            (None, Profile::Production) => "info",
            (None, _) => "debug",
        };
        format!("projector={}", level)
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at application startup; later calls are no-ops. If a global
/// subscriber is already installed (for instance the test capture layer)
/// it is left in place.
///
/// # Errors
///
/// Returns `ConfigurationError` if the log file cannot be created.
pub fn init(settings: &LogSettings) -> Result<()> {
    if INIT_ONCE.is_completed() {
        return Ok(());
    }

    let file = match &settings.file {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };
    let filter = settings.env_filter();
    let profile = settings.profile;

    INIT_ONCE.call_once(move || match profile {
        Profile::Development => {
            let file_layer = file.map(|f| {
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(f))
            });
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(file_layer)
                .try_init();
        }
        Profile::Production => {
            let file_layer = file.map(|f| fmt::layer().json().with_writer(Mutex::new(f)));
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(file_layer)
                .try_init();
        }
        Profile::Test => {
            // Test capture is installed separately via init_test_capture()
            let _ = tracing_subscriber::registry().try_init();
        }
    });

    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ProjectionError::ConfigurationError {
            reason: format!("cannot create log directory {}: {}", parent.display(), e),
        })?;
    }
    File::create(path).map_err(|e| ProjectionError::ConfigurationError {
        reason: format!("cannot create log file {}: {}", path.display(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(&LogSettings::new(Profile::Test)).unwrap();
        init(&LogSettings::new(Profile::Test)).unwrap();
    }

    #[test]
    fn test_default_directive_per_profile() {
        assert_eq!(
            LogSettings::new(Profile::Development).default_directive(),
            "projector=debug"
        );
        assert_eq!(
            LogSettings::new(Profile::Production).default_directive(),
            "projector=info"
        );
        assert_eq!(
            LogSettings::new(Profile::Production)
                .with_level("warn")
                .default_directive(),
            "projector=warn"
        );
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("output").join("log.txt");

        open_log_file(&path).unwrap();

        assert!(path.exists());
    }
}
