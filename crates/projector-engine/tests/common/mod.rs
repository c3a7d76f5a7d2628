use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code)]
pub const MODEL: &str = r#"
classes:
  Study:
    table: Study
    relationships:
      - field: groups
        target: Group
        cardinality: collection
        join: { remote: study_id }
      - field: audit_log
        target: AuditEntry
        cardinality: collection
        join: { remote: study_id }
  Group:
    table: Group
  AuditEntry:
    table: AuditEntry
  Subject:
    table: Subject
    relationships:
      - field: observations
        target: Observation
        cardinality: collection
        join: { remote: subject_id }
  Observation:
    table: Observation
"#;

/// A project directory with templates, model, database and config
#[allow(dead_code)]
pub struct Fixture {
    pub dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl Fixture {
    /// Two studies when `two_studies`, otherwise one; subjects carry `study_id`
    pub fn new(two_studies: bool) -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();

        let templates = root.join("templates");
        fs::create_dir(&templates).unwrap();
        fs::write(templates.join("Study.j2"), r#"{"study": "{{ study.id }}"}"#).unwrap();
        fs::write(
            templates.join("Group.j2"),
            r#"{"group": {{ group.id }}, "study": "{{ study.id }}"}"#,
        )
        .unwrap();
        fs::write(
            templates.join("AuditEntry.j2"),
            r#"{"audit": {{ audit_entry.id }}}"#,
        )
        .unwrap();
        fs::write(
            templates.join("Subject.j2"),
            r#"{"subject": {{ subject.id }}, "study": "{{ study.id }}"}"#,
        )
        .unwrap();
        fs::write(
            templates.join("Observation.j2"),
            r#"{"observation": {{ observation.id }}, "subject": {{ subject.id }}, "study": "{{ study.id }}"}"#,
        )
        .unwrap();

        fs::write(root.join("model.yaml"), MODEL).unwrap();

        let conn = Connection::open(root.join("study.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE tgt_study (id TEXT PRIMARY KEY);
             CREATE TABLE tgt_group (id INTEGER PRIMARY KEY, study_id TEXT);
             CREATE TABLE tgt_auditentry (id INTEGER PRIMARY KEY, study_id TEXT);
             CREATE TABLE tgt_subject (id INTEGER PRIMARY KEY, study_id TEXT);
             CREATE TABLE tgt_observation (id INTEGER PRIMARY KEY, subject_id INTEGER);
             INSERT INTO tgt_study VALUES ('S1');
             INSERT INTO tgt_group VALUES (1, 'S1');
             INSERT INTO tgt_group VALUES (2, 'S1');
             INSERT INTO tgt_auditentry VALUES (1, 'S1');
             INSERT INTO tgt_subject VALUES (1, 'S1');
             INSERT INTO tgt_subject VALUES (2, 'S1');
             INSERT INTO tgt_subject VALUES (3, 'S1');
             INSERT INTO tgt_observation VALUES (10, 1);
             INSERT INTO tgt_observation VALUES (11, 1);
             INSERT INTO tgt_observation VALUES (12, 3);",
        )
        .unwrap();
        if two_studies {
            conn.execute_batch(
                "INSERT INTO tgt_study VALUES ('S2');
                 INSERT INTO tgt_subject VALUES (4, 'S2');",
            )
            .unwrap();
        }

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a config file; `extra_subject` is appended to the subject anchor
    pub fn write_config(&self, layout: &str, extra_subject: &str) -> PathBuf {
        let path = self.root().join("projector.yaml");
        fs::write(
            &path,
            format!(
                r#"
templates: templates
model: model.yaml
database:
  path: study.db
  table_prefix: "tgt_{{}}"
  page_size: 2
anchors:
  study:
    class: Study
    blacklist: [audit_log]
  subject:
    class: Subject
{extra_subject}
output:
  path: output/resources.json
  layout: {layout}
  buffer_size: 3
"#
            ),
        )
        .unwrap();
        path
    }
}
