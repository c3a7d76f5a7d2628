//! Subject-mode traversal
//!
//! ## Scenarios Covered
//!
//! 1. Related documents land in class-keyed buckets with both anchors bound
//! 2. The subject itself is rendered with only the study as context
//! 3. No blacklist applies in subject mode
//! 4. Related render failures are tallied, not raised

mod common;

use projector_core::{AnchorSettings, AnchorSpec, Projector, RowSource, TemplateRegistry};
use serde_json::{json, Value};

fn anchors(source: &projector_core::MemorySource) -> (projector_core::Instance, projector_core::Instance) {
    let study = source.fetch_all("Study").unwrap().remove(0);
    let subject = source.fetch_all("Subject").unwrap().remove(0);
    (study, subject)
}

#[test]
fn test_observations_keyed_by_class_name() {
    // GIVEN subject P1 of study S1 with three observations
    let source = common::populated_source();
    let registry = common::registry();
    let settings = AnchorSettings::default();
    let projector = Projector::new(&registry, &settings);
    let (study, subject) = anchors(&source);

    // WHEN the subject is projected
    let buckets = projector.project_subject(&source, &subject, &study).unwrap();

    // THEN the observation bucket holds three documents built with all three bindings
    let observations: Vec<Value> = buckets
        .get("observation")
        .unwrap()
        .iter()
        .map(|d| serde_json::from_str(d).unwrap())
        .collect();
    assert_eq!(
        observations,
        vec![
            json!({"observation": 1, "subject": "P1", "study": "S1"}),
            json!({"observation": 2, "subject": "P1", "study": "S1"}),
            json!({"observation": 3, "subject": "P1", "study": "S1"}),
        ]
    );
    // AND the untemplated consents produce nothing
    assert_eq!(
        buckets.keys().collect::<Vec<_>>(),
        vec!["subject", "observation"]
    );
}

#[test]
fn test_subject_rendered_with_study_context() {
    // GIVEN a subject template referencing the study
    let source = common::populated_source();
    let registry = common::registry();
    let settings = AnchorSettings::default();
    let projector = Projector::new(&registry, &settings);
    let (study, subject) = anchors(&source);

    // WHEN the subject is projected
    let buckets = projector.project_subject(&source, &subject, &study).unwrap();

    // THEN the subject document sees the study
    let doc: Value = serde_json::from_str(&buckets.get("subject").unwrap()[0]).unwrap();
    assert_eq!(doc, json!({"subject": "P1", "study": "S1"}));
}

#[test]
fn test_subject_blacklist_not_consulted() {
    // GIVEN observations are listed in the subject blacklist
    let source = common::populated_source();
    let registry = common::registry();
    let settings = AnchorSettings {
        study: AnchorSpec::new("Study"),
        subject: AnchorSpec::new("Subject").with_blacklist(["observations"]),
    };
    let projector = Projector::new(&registry, &settings);
    let (study, subject) = anchors(&source);

    // WHEN the subject is projected
    let buckets = projector.project_subject(&source, &subject, &study).unwrap();

    // THEN observations are still rendered
    assert_eq!(buckets.get("observation").unwrap().len(), 3);
}

#[test]
fn test_related_render_failure_is_counted() {
    // GIVEN an observation template referencing an unbound variable
    let source = common::populated_source();
    let registry = TemplateRegistry::from_strings([
        ("Subject", "{}"),
        ("Observation", "{{ patient.id }}"),
    ]);
    let settings = AnchorSettings::default();
    let projector = Projector::new(&registry, &settings);
    let (study, subject) = anchors(&source);

    // WHEN the subject is projected
    let buckets = projector.project_subject(&source, &subject, &study).unwrap();

    // THEN the subject is rendered and each observation failure is tallied
    assert_eq!(buckets.get("subject").unwrap().len(), 1);
    assert!(buckets.get("observation").is_none());
    assert_eq!(buckets.render_failures(), 3);
}
