//! Traversal engine
//!
//! Walks the edge table from an anchor instance and renders every in-scope
//! related instance into a [`BucketMap`].
//!
//! Study mode keys buckets by the edge's field name and honours the study
//! blacklist. Subject mode keys buckets by the target class's variable name
//! and is scoped by template presence alone.

pub mod blacklist;
pub mod buckets;
pub mod study;
pub mod subject;

pub use blacklist::Blacklist;
pub use buckets::BucketMap;

use crate::errors::{ProjectionError, Result};
use crate::model::{Edge, Instance};
use crate::render::Bindings;
use crate::templates::TemplateRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role an anchor plays for one traversal call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorRole {
    Study,
    Subject,
}

impl AnchorRole {
    pub const ALL: [AnchorRole; 2] = [AnchorRole::Study, AnchorRole::Subject];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorRole::Study => "study",
            AnchorRole::Subject => "subject",
        }
    }
}

impl std::fmt::Display for AnchorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor class and traversal options for one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSpec {
    pub class_name: String,
    /// Relationship field names skipped in this role
    pub blacklist: BTreeSet<String>,
    /// Column on the anchor row holding its study's primary key
    pub study_key: Option<String>,
}

impl AnchorSpec {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            blacklist: BTreeSet::new(),
            study_key: None,
        }
    }

    pub fn with_blacklist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_study_key(mut self, column: impl Into<String>) -> Self {
        self.study_key = Some(column.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSettings {
    pub study: AnchorSpec,
    pub subject: AnchorSpec,
}

impl Default for AnchorSettings {
    fn default() -> Self {
        Self {
            study: AnchorSpec::new("Study"),
            subject: AnchorSpec::new("Subject"),
        }
    }
}

impl AnchorSettings {
    pub fn spec(&self, role: AnchorRole) -> &AnchorSpec {
        match role {
            AnchorRole::Study => &self.study,
            AnchorRole::Subject => &self.subject,
        }
    }
}

/// Why an edge is or is not walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeScope {
    InScope,
    Blacklisted,
    NoTemplate,
}

impl EdgeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeScope::InScope => "in scope",
            EdgeScope::Blacklisted => "blacklisted",
            EdgeScope::NoTemplate => "no template",
        }
    }
}

/// Projects anchors through a template registry
///
/// Holds no per-run state; every call returns a fresh partial map.
#[derive(Debug, Clone, Copy)]
pub struct Projector<'a> {
    registry: &'a TemplateRegistry,
    settings: &'a AnchorSettings,
}

impl<'a> Projector<'a> {
    pub fn new(registry: &'a TemplateRegistry, settings: &'a AnchorSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &'a TemplateRegistry {
        self.registry
    }

    pub fn settings(&self) -> &'a AnchorSettings {
        self.settings
    }

    /// Classify an edge of an anchor class for the given role
    pub fn edge_scope(&self, role: AnchorRole, edge: &Edge) -> EdgeScope {
        if role == AnchorRole::Study
            && Blacklist::for_role(self.settings, role).contains(&edge.field)
        {
            return EdgeScope::Blacklisted;
        }
        if !self.registry.contains(&edge.target) {
            return EdgeScope::NoTemplate;
        }
        EdgeScope::InScope
    }

    /// Render a related instance; render failures are tallied, not raised
    fn render_related(
        &self,
        buckets: &mut BucketMap,
        bucket: &str,
        member: &Instance,
        bindings: &Bindings,
    ) -> Result<()> {
        match self.registry.render(member.class_name(), bindings) {
            Ok(document) => {
                tracing::trace!(bucket = %bucket, class = %member.class_name(), "Rendered document");
                buckets.push(bucket, document);
                Ok(())
            }
            Err(err @ ProjectionError::RenderError { .. }) => {
                tracing::error!(
                    bucket = %bucket,
                    class = %member.class_name(),
                    error = %err,
                    "Render failed; document skipped"
                );
                buckets.record_render_failure();
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
