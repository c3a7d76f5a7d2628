//! Command handlers

pub mod model;
pub mod run;
pub mod templates;

use projector_core::logging_facility::{init, Profile};
use projector_engine::ProjectConfig;
use std::path::Path;

/// Load the project file and start logging as it configures
pub(crate) fn load_config(
    path: &Path,
    json_logs: bool,
) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
    let config = ProjectConfig::load(path)?;
    let profile = if json_logs {
        Profile::Production
    } else {
        Profile::Development
    };
    let mut settings = config.logging.to_settings(profile);
    if settings.level.is_none() {
        settings.level = Some("info".to_string());
    }
    init(&settings)?;
    Ok(config)
}
