//! A configured project: templates, model and database wired together

#![allow(clippy::result_large_err)]

use crate::config::ProjectConfig;
use crate::driver::{run_projection, stream_projection, RunOutcome, RunSummary};
use crate::output::{open_consumer, write_buckets};
use projector_core::errors::{ProjectionError, Result};
use projector_core::model::{ModelSchema, TableRewrite};
use projector_core::templates::TemplateRegistry;
use projector_core::traversal::AnchorSettings;
use projector_store::{apply_table_rewrite, db, load_model, SqliteSource};

pub struct Project {
    config: ProjectConfig,
    registry: TemplateRegistry,
    anchors: AnchorSettings,
    source: SqliteSource,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Load the model and apply the configured table rewrite
///
/// # Errors
///
/// `RowSource` wrapping the loader's `Io` / `Serialization` / `InvalidModel`
/// failure.
pub fn load_project_model(config: &ProjectConfig) -> Result<ModelSchema> {
    let mut model = load_model(&config.model)?;
    apply_table_rewrite(
        &mut model,
        &TableRewrite {
            prefix: config.database.table_prefix.clone(),
            schema: config.database.schema.clone(),
        },
    );
    Ok(model)
}

impl Project {
    /// Load templates and model, open the database and check the anchors
    ///
    /// # Errors
    ///
    /// * `TemplateDirNotFound` - the template directory is missing
    /// * `ConfigurationError` - no database configured, or an anchor class is
    ///   not declared in the model
    /// * `RowSource` - the model or database cannot be opened
    pub fn open(config: ProjectConfig) -> Result<Self> {
        let registry = TemplateRegistry::load(&config.templates)?;
        let model = load_project_model(&config)?;

        let anchors = config.anchor_settings();
        for class_name in [&anchors.study.class_name, &anchors.subject.class_name] {
            if !model.contains(class_name) {
                return Err(ProjectionError::ConfigurationError {
                    reason: format!("Anchor class '{}' is not declared in the model", class_name),
                });
            }
        }

        let db_path = config
            .database
            .path
            .as_ref()
            .ok_or_else(|| ProjectionError::ConfigurationError {
                reason: "No database configured (set database.path or pass --db)".to_string(),
            })?;
        let conn = db::open(db_path)?;
        if let (Some(attach), Some(schema)) = (&config.database.attach, &config.database.schema) {
            db::attach(&conn, attach, schema)?;
        }

        tracing::info!(
            templates = registry.len(),
            classes = model.classes().count(),
            database = %db_path.display(),
            "Project opened"
        );

        Ok(Self {
            registry,
            anchors,
            source: SqliteSource::new(conn, model),
            config,
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn anchors(&self) -> &AnchorSettings {
        &self.anchors
    }

    pub fn source(&self) -> &SqliteSource {
        &self.source
    }

    /// Collect every document in memory
    ///
    /// # Errors
    ///
    /// See [`run_projection`].
    pub fn run(&self) -> Result<RunOutcome> {
        run_projection(
            &self.source,
            &self.registry,
            &self.anchors,
            self.config.database.page_size,
        )
    }

    /// Collect, then write the buckets to the configured output
    ///
    /// # Errors
    ///
    /// See [`run_projection`] and [`write_buckets`].
    pub fn run_and_write(&self) -> Result<RunSummary> {
        let outcome = self.run()?;
        write_buckets(&outcome.buckets, &self.config.output)?;
        Ok(outcome.summary)
    }

    /// Stream every anchor's documents to the configured output as it is
    /// projected
    ///
    /// The output is closed on both success and failure; documents
    /// already flushed stay on disk.
    ///
    /// # Errors
    ///
    /// See [`stream_projection`].
    pub fn run_streaming(&self) -> Result<RunSummary> {
        let mut consumer = open_consumer(&self.config.output);
        let result = stream_projection(
            &self.source,
            &self.registry,
            &self.anchors,
            self.config.database.page_size,
            consumer.as_mut(),
        );
        let closed = consumer.close();
        let summary = result?;
        closed?;
        Ok(summary)
    }
}
