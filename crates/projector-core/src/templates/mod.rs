//! Template registry
//!
//! One template per entity class, matched by exact class name against the
//! file stem. Files whose stem does not start with an upper-case letter are
//! loaded as partials that class templates may `include` or `import`.

pub mod registry;

pub use registry::{Template, TemplateRegistry, TEMPLATE_EXTENSION};
