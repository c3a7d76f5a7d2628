use crate::errors::{ProjectionError, Result};
use crate::render::Bindings;
use crate::{log_op_end, log_op_start};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tera::Tera;

/// Recognised template file extension
pub const TEMPLATE_EXTENSION: &str = "j2";

/// A loaded class template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub class_name: String,
    /// Name registered with the engine (the file name)
    pub name: String,
    pub path: Option<PathBuf>,
}

/// Immutable class-name → template lookup backed by Tera
pub struct TemplateRegistry {
    tera: Tera,
    templates: BTreeMap<String, Template>,
    dir: Option<PathBuf>,
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("dir", &self.dir)
            .field("classes", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TemplateRegistry {
    /// Load every `*.j2` file of `dir` (non-recursive)
    ///
    /// Unreadable or malformed templates are logged and skipped.
    ///
    /// # Errors
    ///
    /// * `TemplateDirNotFound` - `dir` does not exist or is not a directory
    /// * `ConfigurationError` - the directory cannot be listed
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let start = Instant::now();
        log_op_start!("load_templates", path = %dir.display());

        if !dir.is_dir() {
            return Err(ProjectionError::TemplateDirNotFound {
                path: dir.to_path_buf(),
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|e| ProjectionError::ConfigurationError {
            reason: format!("Cannot list template directory {}: {}", dir.display(), e),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION))
            .collect();
        files.sort();

        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            match std::fs::read_to_string(&path) {
                Ok(content) => sources.push((path, content)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable template");
                }
            }
        }

        let mut registry = Self::build(
            sources
                .into_iter()
                .filter_map(|(path, content)| {
                    let file_name = path.file_name()?.to_str()?.to_string();
                    Some((file_name, content, Some(path)))
                })
                .collect(),
        );
        registry.dir = Some(dir.to_path_buf());

        log_op_end!(
            "load_templates",
            duration_ms = start.elapsed().as_millis() as u64,
            templates = registry.len()
        );
        Ok(registry)
    }

    /// Build a registry from in-memory `(class name, source)` pairs
    ///
    /// Names are treated like file stems, so lower-case names become
    /// partials reachable as `<name>.j2`.
    pub fn from_strings<I, N, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut sources: Vec<(String, String, Option<PathBuf>)> = templates
            .into_iter()
            .map(|(name, content)| {
                (
                    format!("{}.{}", name.into(), TEMPLATE_EXTENSION),
                    content.into(),
                    None,
                )
            })
            .collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        Self::build(sources)
    }

    fn build(sources: Vec<(String, String, Option<PathBuf>)>) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        let (classes, partials): (Vec<_>, Vec<_>) = sources
            .into_iter()
            .partition(|(file_name, _, _)| is_class_template(file_name));

        for (file_name, content, _) in partials {
            if let Err(e) = tera.add_raw_template(&file_name, &content) {
                tracing::warn!(
                    template = %file_name,
                    error = %format_tera_error(&e),
                    "Skipping malformed partial"
                );
            }
        }

        let mut templates = BTreeMap::new();
        for (file_name, content, path) in classes {
            let class_name = file_name
                .strip_suffix(&format!(".{}", TEMPLATE_EXTENSION))
                .unwrap_or(&file_name)
                .to_string();

            match tera.add_raw_template(&file_name, &content) {
                Ok(()) => {
                    tracing::debug!(class = %class_name, template = %file_name, "Loaded template");
                    templates.insert(
                        class_name.clone(),
                        Template {
                            class_name,
                            name: file_name,
                            path,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        class = %class_name,
                        error = %format_tera_error(&e),
                        "Skipping malformed template"
                    );
                }
            }
        }

        Self {
            tera,
            templates,
            dir: None,
        }
    }

    /// Look up the template for a class
    ///
    /// # Errors
    ///
    /// `MissingTemplate` if no template is registered for the class.
    pub fn get(&self, class_name: &str) -> Result<&Template> {
        self.templates
            .get(class_name)
            .ok_or_else(|| ProjectionError::MissingTemplate {
                class_name: class_name.to_string(),
            })
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.templates.contains_key(class_name)
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Directory the registry was loaded from
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Render the class template with the given bindings
    ///
    /// # Errors
    ///
    /// * `MissingTemplate` - no template for the class
    /// * `RenderError` - the engine failed; carries the bound variable names
    pub fn render(&self, class_name: &str, bindings: &Bindings) -> Result<String> {
        let template = self.get(class_name)?;
        self.tera
            .render(&template.name, &bindings.to_context())
            .map_err(|e| ProjectionError::RenderError {
                class_name: class_name.to_string(),
                binding_keys: bindings.keys(),
                message: format_tera_error(&e),
            })
    }
}

fn is_class_template(file_name: &str) -> bool {
    file_name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Flatten a Tera error and its sources into one line
fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages.retain(|m| !m.trim().is_empty());
    messages.join(": ")
}
