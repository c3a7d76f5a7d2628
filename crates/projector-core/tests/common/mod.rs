use projector_core::{Instance, MemorySource, ModelSchema, TemplateRegistry};
use serde_json::json;

/// Study with groups, a site, an audit log and subjects; subjects with
/// observations and an untemplated consent record
#[allow(dead_code)]
pub const MODEL_YAML: &str = r#"
classes:
  Study:
    relationships:
      - field: groups
        target: Group
        cardinality: collection
        join: { remote: study_id }
      - field: site
        target: Site
        cardinality: singular
        join: { local: site_id }
      - field: audit_log
        target: AuditEntry
        cardinality: collection
        join: { remote: study_id }
      - field: subject
        target: Subject
        cardinality: collection
        join: { remote: study_id }
  Group: {}
  Site: {}
  AuditEntry: {}
  Subject:
    relationships:
      - field: observations
        target: Observation
        cardinality: collection
        join: { remote: subject_id }
      - field: consents
        target: Consent
        cardinality: collection
        join: { remote: subject_id }
  Observation: {}
  Consent: {}
"#;

#[allow(dead_code)]
pub fn model() -> ModelSchema {
    ModelSchema::from_yaml_str(MODEL_YAML).unwrap()
}

/// One study `S1`, two groups, one site, one audit entry, subject `P1`
/// with three observations and one consent
#[allow(dead_code)]
pub fn populated_source() -> MemorySource {
    let mut source = MemorySource::new(model());
    let rows = [
        ("Study", json!({"id": "S1", "title": "Pilot", "site_id": 10})),
        ("Group", json!({"id": "g1", "study_id": "S1"})),
        ("Group", json!({"id": "g2", "study_id": "S1"})),
        ("Site", json!({"id": 10, "name": "North"})),
        ("AuditEntry", json!({"id": 1, "study_id": "S1"})),
        ("Subject", json!({"id": "P1", "study_id": "S1"})),
        ("Observation", json!({"id": 1, "subject_id": "P1", "code": "hr"})),
        ("Observation", json!({"id": 2, "subject_id": "P1", "code": "bp"})),
        ("Observation", json!({"id": 3, "subject_id": "P1", "code": "rr"})),
        ("Consent", json!({"id": 1, "subject_id": "P1"})),
    ];
    for (class_name, row) in rows {
        source.insert(Instance::from_json(class_name, row)).unwrap();
    }
    source
}

/// Templates for every class except `AuditEntry` and `Consent`
#[allow(dead_code)]
pub fn registry() -> TemplateRegistry {
    TemplateRegistry::from_strings([
        ("Study", r#"{"study": "{{ study.id }}"}"#),
        ("Group", r#"{"group": "{{ group.id }}", "study": "{{ study.id }}"}"#),
        ("Site", r#"{"site": "{{ site.name }}"}"#),
        ("Subject", r#"{"subject": "{{ subject.id }}", "study": "{{ study.id }}"}"#),
        (
            "Observation",
            r#"{"observation": {{ observation.id }}, "subject": "{{ subject.id }}", "study": "{{ study.id }}"}"#,
        ),
    ])
}
