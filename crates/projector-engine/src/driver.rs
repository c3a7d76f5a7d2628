//! Run driver
//!
//! Visits studies first (fetched eagerly), then subjects (streamed page by
//! page), handing each anchor's partial bucket map to a collector.
//!
//! ## Logging Ownership
//!
//! The driver owns the run boundary (`run_projection` / `stream_projection`
//! start and end events, tagged with the run id). Traversal logs its own
//! per-anchor boundaries below it.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use projector_core::errors::{ProjectionError, Result};
use projector_core::model::Instance;
use projector_core::sink::DocumentConsumer;
use projector_core::source::RowSource;
use projector_core::templates::TemplateRegistry;
use projector_core::traversal::{AnchorSettings, BucketMap, Projector};
use projector_core::{log_op_end, log_op_error, log_op_start};
use projector_core_types::RunId;
use serde::Serialize;
use std::time::Instant;

/// Counters for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub studies: usize,
    pub subjects: usize,
    pub documents: usize,
    pub render_failures: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    fn start(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            studies: 0,
            subjects: 0,
            documents: 0,
            render_failures: 0,
            duration_ms: 0,
        }
    }
}

/// Everything a collecting run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub buckets: BucketMap,
    pub summary: RunSummary,
}

/// Project every study and subject into one bucket map
///
/// # Errors
///
/// * `MissingTemplate` / `RenderError` - an anchor cannot be rendered
/// * `AnchorUnresolved` - a subject's study cannot be determined
/// * `RowSource` - the source failed
pub fn run_projection(
    source: &dyn RowSource,
    registry: &TemplateRegistry,
    settings: &AnchorSettings,
    page_size: usize,
) -> Result<RunOutcome> {
    let run_id = RunId::new();
    let start = Instant::now();
    log_op_start!("run_projection", run_id = %run_id);

    let mut buckets = BucketMap::new();
    let result = visit(source, registry, settings, page_size, run_id.clone(), &mut |partial| {
        buckets.merge(partial);
        Ok(())
    });

    finish("run_projection", result, start).map(|summary| RunOutcome { buckets, summary })
}

/// Project every study and subject straight into `consumer`
///
/// Each anchor's documents are handed over as soon as that anchor is
/// projected, so memory is bounded by one anchor's output. The consumer is
/// not closed.
///
/// # Errors
///
/// As [`run_projection`], plus any consumer failure.
pub fn stream_projection(
    source: &dyn RowSource,
    registry: &TemplateRegistry,
    settings: &AnchorSettings,
    page_size: usize,
    consumer: &mut dyn DocumentConsumer,
) -> Result<RunSummary> {
    let run_id = RunId::new();
    let start = Instant::now();
    log_op_start!("stream_projection", run_id = %run_id);

    let result = visit(source, registry, settings, page_size, run_id, &mut |mut partial| {
        partial.drain_into(&mut *consumer).map(|_| ())
    });

    finish("stream_projection", result, start)
}

fn finish(op: &str, result: Result<RunSummary>, start: Instant) -> Result<RunSummary> {
    let duration_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(mut summary) => {
            summary.duration_ms = duration_ms;
            log_op_end!(
                op,
                duration_ms = duration_ms,
                run_id = %summary.run_id,
                studies = summary.studies,
                subjects = summary.subjects,
                documents = summary.documents,
                render_failures = summary.render_failures
            );
            Ok(summary)
        }
        Err(err) => {
            log_op_error!(op, &err, duration_ms = duration_ms);
            Err(err)
        }
    }
}

fn visit(
    source: &dyn RowSource,
    registry: &TemplateRegistry,
    settings: &AnchorSettings,
    page_size: usize,
    run_id: RunId,
    collect: &mut dyn FnMut(BucketMap) -> Result<()>,
) -> Result<RunSummary> {
    let projector = Projector::new(registry, settings);
    let mut summary = RunSummary::start(run_id);

    let studies = source.fetch_all(&settings.study.class_name)?;
    tracing::info!(studies = studies.len(), "Projecting studies");
    for study in &studies {
        let partial = projector.project_study(source, study)?;
        tally(&mut summary, &partial);
        summary.studies += 1;
        collect(partial)?;
    }

    let resolver = StudyResolver::new(source, settings, &studies)?;
    for subject in source.stream(&settings.subject.class_name, page_size)? {
        let subject = subject?;
        let study = resolver.resolve(&subject)?;
        let partial = projector.project_subject(source, &subject, study)?;
        tally(&mut summary, &partial);
        summary.subjects += 1;
        collect(partial)?;
    }

    Ok(summary)
}

fn tally(summary: &mut RunSummary, partial: &BucketMap) {
    summary.documents += partial.document_count();
    summary.render_failures += partial.render_failures();
}

/// Picks the study anchor for each subject
struct StudyResolver<'s> {
    studies: &'s [Instance],
    study_pk: String,
    subject_pk: String,
    study_key: Option<String>,
}

impl<'s> StudyResolver<'s> {
    fn new(
        source: &dyn RowSource,
        settings: &AnchorSettings,
        studies: &'s [Instance],
    ) -> Result<Self> {
        let model = source.model();
        let study_pk = model.class(&settings.study.class_name)?.primary_key.clone();
        let subject_pk = model.class(&settings.subject.class_name)?.primary_key.clone();
        Ok(Self {
            studies,
            study_pk,
            subject_pk,
            study_key: settings.subject.study_key.clone(),
        })
    }

    /// Study named by the subject's `study_key` column, or the only study
    fn resolve(&self, subject: &Instance) -> Result<&'s Instance> {
        let unresolved = |reason: String| ProjectionError::AnchorUnresolved {
            subject: subject.describe(&self.subject_pk),
            reason,
        };

        match &self.study_key {
            Some(column) => {
                let key = subject
                    .get_non_null(column)
                    .ok_or_else(|| unresolved(format!("column '{}' is empty", column)))?;
                self.studies
                    .iter()
                    .find(|study| study.get(&self.study_pk) == Some(key))
                    .ok_or_else(|| unresolved(format!("no study with {} = {}", self.study_pk, key)))
            }
            None => match self.studies {
                [only] => Ok(only),
                [] => Err(unresolved("no studies were found".to_string())),
                _ => Err(unresolved(format!(
                    "{} studies found and no study_key configured",
                    self.studies.len()
                ))),
            },
        }
    }
}
