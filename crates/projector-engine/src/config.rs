//! Project configuration
//!
//! Parses the YAML project file and validates it. Relative paths are
//! resolved against the directory holding the file; command-line
//! overrides are applied afterwards and always win.

#![allow(clippy::result_large_err)]

use projector_core::errors::{ProjectionError, Result};
use projector_core::logging_facility::{LogSettings, Profile};
use projector_core::traversal::{AnchorSettings, AnchorSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Template directory
    pub templates: PathBuf,
    /// Model description file
    pub model: PathBuf,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub anchors: AnchorsConfig,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Table-name pattern; `{}` stands for the lower-cased table name.
    /// Defaults to the `tgt_` prefix of the warehouse build; `""` keeps
    /// model table names as they are.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// Schema qualifier for every table
    #[serde(default)]
    pub schema: Option<String>,
    /// Database file attached under `schema`
    #[serde(default)]
    pub attach: Option<PathBuf>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            table_prefix: default_table_prefix(),
            schema: None,
            attach: None,
            page_size: default_page_size(),
        }
    }
}

fn default_table_prefix() -> String {
    "tgt_".to_string()
}

fn default_page_size() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorConfig {
    pub class: String,
    #[serde(default)]
    pub blacklist: Vec<String>,
    #[serde(default)]
    pub study_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorsConfig {
    #[serde(default = "default_study_anchor")]
    pub study: AnchorConfig,
    #[serde(default = "default_subject_anchor")]
    pub subject: AnchorConfig,
}

impl Default for AnchorsConfig {
    fn default() -> Self {
        Self {
            study: default_study_anchor(),
            subject: default_subject_anchor(),
        }
    }
}

fn default_study_anchor() -> AnchorConfig {
    AnchorConfig {
        class: "Study".to_string(),
        blacklist: Vec::new(),
        study_key: None,
    }
}

fn default_subject_anchor() -> AnchorConfig {
    AnchorConfig {
        class: "Subject".to_string(),
        blacklist: Vec::new(),
        study_key: None,
    }
}

impl AnchorsConfig {
    pub fn to_settings(&self) -> AnchorSettings {
        let spec = |anchor: &AnchorConfig| {
            let base = AnchorSpec::new(anchor.class.clone())
                .with_blacklist(anchor.blacklist.iter().cloned());
            match &anchor.study_key {
                Some(column) => base.with_study_key(column.clone()),
                None => base,
            }
        };
        AnchorSettings {
            study: spec(&self.study),
            subject: spec(&self.subject),
        }
    }
}

/// How buckets are laid out on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// Every bucket in one array file, buckets in insertion order
    #[default]
    Single,
    /// One array file per bucket under a directory
    PerBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub layout: OutputLayout,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            layout: OutputLayout::default(),
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output/resources.json")
}

fn default_buffer_size() -> usize {
    100
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn to_settings(&self, profile: Profile) -> LogSettings {
        let mut settings = LogSettings::new(profile);
        if let Some(level) = &self.level {
            settings = settings.with_level(level.clone());
        }
        if let Some(file) = &self.file {
            settings = settings.with_file(file.clone());
        }
        settings
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub templates: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub buffer_size: Option<usize>,
}

impl ProjectConfig {
    /// Read, resolve and validate a project file
    ///
    /// # Errors
    ///
    /// `ConfigurationError` when the file cannot be read, does not parse,
    /// or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ProjectionError::ConfigurationError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml_str(&content, base_dir)
    }

    /// Parse a project file's content, resolving paths against `base_dir`
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for malformed YAML or invalid values.
    pub fn from_yaml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: ProjectConfig =
            serde_yaml::from_str(content).map_err(|e| ProjectionError::ConfigurationError {
                reason: format!("YAML parse error: {}", e),
            })?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        resolve(&mut self.templates);
        resolve(&mut self.model);
        resolve(&mut self.output.path);
        if let Some(p) = self.database.path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.database.attach.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.logging.file.as_mut() {
            resolve(p);
        }
    }

    /// Apply command-line values over the file's values
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if the result no longer validates.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(templates) = &overrides.templates {
            self.templates = templates.clone();
        }
        if let Some(database) = &overrides.database {
            self.database.path = Some(database.clone());
        }
        if let Some(output) = &overrides.output {
            self.output.path = output.clone();
        }
        if let Some(buffer_size) = overrides.buffer_size {
            self.output.buffer_size = buffer_size;
        }
        self.validate()
    }

    /// Check value ranges and required names
    ///
    /// # Errors
    ///
    /// `ConfigurationError` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(ProjectionError::ConfigurationError {
                reason: reason.to_string(),
            })
        };
        if self.output.buffer_size == 0 {
            return invalid("output.buffer_size must be at least 1");
        }
        if self.database.page_size == 0 {
            return invalid("database.page_size must be at least 1");
        }
        if self.anchors.study.class.trim().is_empty() {
            return invalid("anchors.study.class must not be empty");
        }
        if self.anchors.subject.class.trim().is_empty() {
            return invalid("anchors.subject.class must not be empty");
        }
        if self.database.attach.is_some() && self.database.schema.is_none() {
            return invalid("database.attach requires database.schema");
        }
        Ok(())
    }

    pub fn anchor_settings(&self) -> AnchorSettings {
        self.anchors.to_settings()
    }
}
