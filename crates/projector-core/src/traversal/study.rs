use super::{Blacklist, BucketMap, Projector};
use crate::errors::Result;
use crate::model::{var_name, Instance};
use crate::render::build_bindings;
use crate::source::RowSource;
use crate::traversal::AnchorRole;
use crate::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

impl<'a> Projector<'a> {
    /// Project a study anchor and its direct relations
    ///
    /// The study is rendered first under its variable name. Every edge of
    /// the study's class is then walked unless its field is blacklisted or
    /// its target class has no template; members land in the bucket named
    /// after the edge's field.
    ///
    /// # Errors
    ///
    /// * `MissingTemplate` / `RenderError` - the study itself cannot be rendered
    /// * `UnknownClass` - the study's class is not in the model
    /// * `RowSource` - fetching related rows failed
    pub fn project_study(&self, source: &dyn RowSource, study: &Instance) -> Result<BucketMap> {
        let start = Instant::now();
        log_op_start!("project_study", class = %study.class_name());

        let result = self.walk_study(source, study);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(buckets) => {
                log_op_end!(
                    "project_study",
                    duration_ms = duration_ms,
                    documents = buckets.document_count()
                );
            }
            Err(err) => {
                log_op_error!("project_study", err, duration_ms = duration_ms);
            }
        }
        result
    }

    fn walk_study(&self, source: &dyn RowSource, study: &Instance) -> Result<BucketMap> {
        let mut buckets = BucketMap::new();

        let document = self
            .registry
            .render(study.class_name(), &build_bindings(study, study, None))?;
        buckets.push(&var_name(study.class_name()), document);

        let blacklist = Blacklist::for_role(self.settings, AnchorRole::Study);
        for edge in source.model().edges(study.class_name())? {
            if blacklist.contains(&edge.field) {
                tracing::debug!(field = %edge.field, "Skipping blacklisted study relation");
                continue;
            }
            if !self.registry.contains(&edge.target) {
                tracing::debug!(
                    field = %edge.field,
                    target = %edge.target,
                    "Skipping study relation without template"
                );
                continue;
            }

            for member in source.related(study, edge)? {
                let bindings = build_bindings(&member, study, None);
                self.render_related(&mut buckets, &edge.field, &member, &bindings)?;
            }
        }

        Ok(buckets)
    }
}
