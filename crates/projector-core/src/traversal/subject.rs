use super::{BucketMap, Projector};
use crate::errors::Result;
use crate::model::{var_name, Instance};
use crate::render::build_bindings;
use crate::source::RowSource;
use crate::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

impl<'a> Projector<'a> {
    /// Project a subject anchor and its direct relations
    ///
    /// The subject is rendered first under its variable name with only the
    /// study as context. Every edge whose target class has a template is
    /// then walked with both anchors bound; members land in the bucket named
    /// after the target class's variable name. No blacklist applies.
    ///
    /// # Errors
    ///
    /// * `MissingTemplate` / `RenderError` - the subject itself cannot be rendered
    /// * `UnknownClass` - the subject's class is not in the model
    /// * `RowSource` - fetching related rows failed
    pub fn project_subject(
        &self,
        source: &dyn RowSource,
        subject: &Instance,
        study: &Instance,
    ) -> Result<BucketMap> {
        let start = Instant::now();
        log_op_start!("project_subject", class = %subject.class_name());

        let result = self.walk_subject(source, subject, study);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(buckets) => {
                log_op_end!(
                    "project_subject",
                    duration_ms = duration_ms,
                    documents = buckets.document_count()
                );
            }
            Err(err) => {
                log_op_error!("project_subject", err, duration_ms = duration_ms);
            }
        }
        result
    }

    fn walk_subject(
        &self,
        source: &dyn RowSource,
        subject: &Instance,
        study: &Instance,
    ) -> Result<BucketMap> {
        let mut buckets = BucketMap::new();

        let document = self
            .registry
            .render(subject.class_name(), &build_bindings(subject, study, None))?;
        buckets.push(&var_name(subject.class_name()), document);

        for edge in source.model().edges(subject.class_name())? {
            if !self.registry.contains(&edge.target) {
                tracing::debug!(
                    field = %edge.field,
                    target = %edge.target,
                    "Skipping subject relation without template"
                );
                continue;
            }

            let bucket = var_name(&edge.target);
            for member in source.related(subject, edge)? {
                let bindings = build_bindings(&member, study, Some(subject));
                self.render_related(&mut buckets, &bucket, &member, &bindings)?;
            }
        }

        Ok(buckets)
    }
}
