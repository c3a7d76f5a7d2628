//! Run driver integration tests
//!
//! ## Scenarios Covered
//!
//! 1. A full run writes every bucket into one array file
//! 2. Streaming and collecting runs produce the same documents
//! 3. Subjects resolve their study through `study_key`
//! 4. Several studies without `study_key` cannot be resolved
//! 5. Per-bucket layout writes one file per bucket
//! 6. A missing template directory fails before traversal

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use projector_core::errors::{ExErrorKind, ProjectionError};
use projector_engine::{Project, ProjectConfig};
use serde_json::{json, Value};
use std::fs;

fn read_array(path: &std::path::Path) -> Vec<Value> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_full_run_single_file() {
    // GIVEN one study with two groups and three subjects
    let fixture = common::Fixture::new(false);
    let config = ProjectConfig::load(fixture.write_config("single", "")).unwrap();

    // WHEN the project is run and written
    let project = Project::open(config).unwrap();
    let summary = project.run_and_write().unwrap();

    // THEN the counters reflect every anchor and document
    assert_eq!(summary.studies, 1);
    assert_eq!(summary.subjects, 3);
    assert_eq!(summary.documents, 1 + 2 + 3 + 3);
    assert_eq!(summary.render_failures, 0);

    // AND the file holds the buckets in visitation order, audit log excluded
    let docs = read_array(&fixture.root().join("output/resources.json"));
    assert_eq!(docs.len(), 9);
    assert_eq!(docs[0], json!({"study": "S1"}));
    assert_eq!(docs[1], json!({"group": 1, "study": "S1"}));
    assert_eq!(docs[2], json!({"group": 2, "study": "S1"}));
    assert_eq!(docs[3], json!({"subject": 1, "study": "S1"}));
    assert_eq!(docs[5], json!({"subject": 3, "study": "S1"}));
    assert_eq!(docs[6], json!({"observation": 10, "subject": 1, "study": "S1"}));
    assert_eq!(docs[8], json!({"observation": 12, "subject": 3, "study": "S1"}));
    assert!(!docs.iter().any(|d| d.get("audit").is_some()));
}

#[test]
fn test_streaming_matches_collecting() {
    // GIVEN the same project run both ways
    let fixture = common::Fixture::new(false);
    let config = ProjectConfig::load(fixture.write_config("single", "")).unwrap();
    let project = Project::open(config).unwrap();

    // WHEN documents are collected and streamed
    let outcome = project.run().unwrap();
    let summary = project.run_streaming().unwrap();

    // THEN both runs see the same documents
    let streamed = read_array(&fixture.root().join("output/resources.json"));
    assert_eq!(summary.documents, outcome.summary.documents);
    assert_eq!(streamed.len(), outcome.buckets.document_count());
    let mut collected: Vec<Value> = outcome
        .buckets
        .iter()
        .flat_map(|(_, docs)| docs.iter().map(|d| serde_json::from_str(d).unwrap()))
        .collect();
    let mut streamed_sorted = streamed.clone();
    collected.sort_by_key(|v| v.to_string());
    streamed_sorted.sort_by_key(|v| v.to_string());
    assert_eq!(collected, streamed_sorted);

    // AND each anchor is written before its relations, anchor by anchor
    assert_eq!(streamed[0], json!({"study": "S1"}));
    assert_eq!(streamed[1], json!({"group": 1, "study": "S1"}));
    assert_eq!(streamed[3], json!({"subject": 1, "study": "S1"}));
    assert_eq!(streamed[4], json!({"observation": 10, "subject": 1, "study": "S1"}));
    assert_eq!(streamed[6], json!({"subject": 2, "study": "S1"}));
    assert_eq!(streamed[7], json!({"subject": 3, "study": "S1"}));
}

#[test]
fn test_study_key_resolution() {
    // GIVEN two studies and subjects pointing at them through study_id
    let fixture = common::Fixture::new(true);
    let config =
        ProjectConfig::load(fixture.write_config("single", "    study_key: study_id")).unwrap();
    let project = Project::open(config).unwrap();

    // WHEN the project is run
    let outcome = project.run().unwrap();

    // THEN subject 4 was rendered against study S2
    let subjects: Vec<Value> = outcome
        .buckets
        .get("subject")
        .unwrap()
        .iter()
        .map(|d| serde_json::from_str(d).unwrap())
        .collect();
    assert!(subjects.contains(&json!({"subject": 4, "study": "S2"})));
    assert!(subjects.contains(&json!({"subject": 1, "study": "S1"})));
    assert_eq!(outcome.summary.studies, 2);
}

#[test]
fn test_ambiguous_study_is_unresolved() {
    // GIVEN two studies and no study_key
    let fixture = common::Fixture::new(true);
    let config = ProjectConfig::load(fixture.write_config("single", "")).unwrap();
    let project = Project::open(config).unwrap();

    // WHEN the project is run
    let err = project.run().unwrap_err();

    // THEN the subject's study cannot be resolved
    assert!(matches!(err, ProjectionError::AnchorUnresolved { .. }));
    assert_eq!(err.kind(), ExErrorKind::AnchorUnresolved);
}

#[test]
fn test_per_bucket_layout() {
    // GIVEN a per-bucket layout
    let fixture = common::Fixture::new(false);
    let config = ProjectConfig::load(fixture.write_config("per_bucket", "")).unwrap();
    let project = Project::open(config).unwrap();

    // WHEN the project is streamed
    project.run_streaming().unwrap();

    // THEN every bucket has its own file
    let out = fixture.root().join("output/resources.json");
    assert_eq!(read_array(&out.join("study.json")).len(), 1);
    assert_eq!(read_array(&out.join("groups.json")).len(), 2);
    assert_eq!(read_array(&out.join("subject.json")).len(), 3);
    assert_eq!(read_array(&out.join("observation.json")).len(), 3);
    assert!(!out.join("audit_log.json").exists());
}

#[test]
fn test_missing_template_dir() {
    // GIVEN a config whose template directory is gone
    let fixture = common::Fixture::new(false);
    let config_path = fixture.write_config("single", "");
    fs::remove_dir_all(fixture.root().join("templates")).unwrap();
    let config = ProjectConfig::load(config_path).unwrap();

    // WHEN the project is opened
    let err = Project::open(config).unwrap_err();

    // THEN it fails with a configuration error
    assert!(matches!(err, ProjectionError::TemplateDirNotFound { .. }));
    assert_eq!(err.kind(), ExErrorKind::Configuration);
}
