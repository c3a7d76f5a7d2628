use crate::model::{var_name, Instance};
use serde_json::Value;
use std::collections::BTreeMap;

/// Variable bindings handed to the template engine
///
/// Keys are derived variable names (`StudySubject` → `study_subject`),
/// values are the instances' column maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<String, Value>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an instance under its derived variable name
    ///
    /// A later binding for the same name replaces the earlier one.
    pub fn bind(&mut self, instance: &Instance) {
        self.0
            .insert(var_name(instance.class_name()), instance.to_value());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Bound variable names, sorted
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        for (name, value) in &self.0 {
            context.insert(name.as_str(), value);
        }
        context
    }
}

/// Build the bindings for rendering `entity` in the context of its anchors
///
/// Bound in order: the entity, the study anchor, then the subject anchor
/// when present. When two of them derive the same variable name the later
/// one wins, so the study anchor rendered as itself yields a single key.
pub fn build_bindings(entity: &Instance, study: &Instance, subject: Option<&Instance>) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.bind(entity);
    bindings.bind(study);
    if let Some(subject) = subject {
        bindings.bind(subject);
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bindings_for_subject_relation() {
        let study = Instance::from_json("Study", json!({"id": "S1"}));
        let subject = Instance::from_json("Subject", json!({"id": "P1"}));
        let obs = Instance::from_json("Observation", json!({"id": 1}));

        let bindings = build_bindings(&obs, &study, Some(&subject));

        assert_eq!(bindings.keys(), vec!["observation", "study", "subject"]);
        assert_eq!(bindings.get("subject"), Some(&json!({"id": "P1"})));
    }

    #[test]
    fn test_study_rendered_as_itself_has_one_key() {
        let study = Instance::from_json("Study", json!({"id": "S1"}));

        let bindings = build_bindings(&study, &study, None);

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("study"), Some(&json!({"id": "S1"})));
    }

    #[test]
    fn test_anchor_wins_name_collision() {
        let study = Instance::from_json("Study", json!({"id": "S1"}));
        let other = Instance::from_json("Study", json!({"id": "S2"}));

        let bindings = build_bindings(&other, &study, None);

        assert_eq!(bindings.get("study"), Some(&json!({"id": "S1"})));
    }

    #[test]
    fn test_context_exposes_fields() {
        let study = Instance::from_json("ResearchStudy", json!({"title": "Pilot"}));
        let bindings = build_bindings(&study, &study, None);

        let mut tera = tera::Tera::default();
        tera.add_raw_template("t", "{{ research_study.title }}").unwrap();
        let out = tera.render("t", &bindings.to_context()).unwrap();

        assert_eq!(out, "Pilot");
    }
}
