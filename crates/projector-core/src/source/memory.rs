use super::{InstanceStream, RowSource, SourceResult};
use crate::errors::{ExError, ExErrorKind};
use crate::model::{Cardinality, Edge, EntityClass, Instance, Join, ModelSchema};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// In-memory row source
///
/// Rows are kept per class in insertion order, which is also the delivery
/// order of `fetch_all` and `stream`. Not thread-safe; designed for
/// embedding small datasets and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    model: ModelSchema,
    rows: HashMap<String, Vec<Instance>>,
    links: HashMap<String, Vec<Map<String, Value>>>,
}

impl MemorySource {
    pub fn new(model: ModelSchema) -> Self {
        Self {
            model,
            rows: HashMap::new(),
            links: HashMap::new(),
        }
    }

    /// Add a row
    ///
    /// # Errors
    ///
    /// `NotFound` if the instance's class is not in the model.
    pub fn insert(&mut self, instance: Instance) -> SourceResult<()> {
        self.class(instance.class_name())?;
        self.rows
            .entry(instance.class_name().to_string())
            .or_default()
            .push(instance);
        Ok(())
    }

    /// Add a row to an association table used by `through` joins
    pub fn insert_link(&mut self, table: impl Into<String>, row: Value) {
        if let Value::Object(map) = row {
            self.links.entry(table.into()).or_default().push(map);
        }
    }

    fn class(&self, name: &str) -> SourceResult<&EntityClass> {
        self.model.class(name).map_err(|_| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("memory_source")
                .with_class(name)
                .with_message("Class is not declared in the model")
        })
    }

    fn rows_of(&self, class_name: &str) -> &[Instance] {
        self.rows.get(class_name).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RowSource for MemorySource {
    fn model(&self) -> &ModelSchema {
        &self.model
    }

    fn fetch_all(&self, class_name: &str) -> SourceResult<Vec<Instance>> {
        self.class(class_name)?;
        Ok(self.rows_of(class_name).to_vec())
    }

    fn stream<'a>(
        &'a self,
        class_name: &str,
        page_size: usize,
    ) -> SourceResult<InstanceStream<'a>> {
        self.class(class_name)?;
        let page_size = page_size.max(1);
        let rows = self.rows_of(class_name);
        Ok(Box::new(
            rows.chunks(page_size)
                .flat_map(|page| page.iter().cloned().map(Ok)),
        ))
    }

    fn related(&self, instance: &Instance, edge: &Edge) -> SourceResult<Vec<Instance>> {
        let owner = self.class(instance.class_name())?;
        let target = self.class(&edge.target)?;
        let candidates = self.rows_of(&target.name);

        let mut members: Vec<Instance> = match &edge.join {
            Join::Local { column } => match instance.get_non_null(column) {
                Some(key) => candidates
                    .iter()
                    .filter(|row| row.get(&target.primary_key) == Some(key))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            },
            Join::Remote { column } => match instance.get_non_null(&owner.primary_key) {
                Some(key) => candidates
                    .iter()
                    .filter(|row| row.get(column) == Some(key))
                    .cloned()
                    .collect(),
                None => Vec::new(),
            },
            Join::Through {
                table,
                local,
                remote,
            } => match instance.get_non_null(&owner.primary_key) {
                Some(key) => {
                    let linked: Vec<&Value> = self
                        .links
                        .get(table)
                        .map(|rows| {
                            rows.iter()
                                .filter(|link| link.get(local) == Some(key))
                                .filter_map(|link| link.get(remote))
                                .collect()
                        })
                        .unwrap_or_default();
                    candidates
                        .iter()
                        .filter(|row| {
                            row.get(&target.primary_key)
                                .is_some_and(|pk| linked.contains(&pk))
                        })
                        .cloned()
                        .collect()
                }
                None => Vec::new(),
            },
        };

        members.sort_by(|a, b| {
            compare_keys(a.get(&target.primary_key), b.get(&target.primary_key))
        });
        if edge.cardinality == Cardinality::Singular {
            members.truncate(1);
        }
        Ok(members)
    }
}

/// Order primary keys the way SQLite would: numbers before text
fn compare_keys(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Number(_)), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> ModelSchema {
        ModelSchema::from_yaml_str(
            r#"
classes:
  Subject:
    relationships:
      - field: observations
        target: Observation
        cardinality: collection
        join: { remote: subject_id }
      - field: site
        target: Site
        cardinality: singular
        join: { local: site_id }
      - field: diagnoses
        target: Diagnosis
        cardinality: collection
        join: { through: subject_diagnosis, local: subject_id, remote: diagnosis_id }
  Observation: {}
  Site: {}
  Diagnosis: {}
"#,
        )
        .unwrap()
    }

    fn source() -> MemorySource {
        let mut source = MemorySource::new(model());
        source
            .insert(Instance::from_json("Subject", json!({"id": "P1", "site_id": 7})))
            .unwrap();
        source
            .insert(Instance::from_json("Subject", json!({"id": "P2", "site_id": null})))
            .unwrap();
        for (id, subject) in [(3, "P1"), (1, "P1"), (2, "P2")] {
            source
                .insert(Instance::from_json(
                    "Observation",
                    json!({"id": id, "subject_id": subject}),
                ))
                .unwrap();
        }
        source
            .insert(Instance::from_json("Site", json!({"id": 7, "name": "North"})))
            .unwrap();
        source
            .insert(Instance::from_json("Diagnosis", json!({"id": "D1"})))
            .unwrap();
        source
            .insert(Instance::from_json("Diagnosis", json!({"id": "D2"})))
            .unwrap();
        source.insert_link("subject_diagnosis", json!({"subject_id": "P1", "diagnosis_id": "D2"}));
        source
    }

    fn edge<'a>(source: &'a MemorySource, field: &str) -> &'a Edge {
        source
            .model()
            .edges("Subject")
            .unwrap()
            .iter()
            .find(|e| e.field == field)
            .unwrap()
    }

    #[test]
    fn test_remote_join_sorted_by_primary_key() {
        let source = source();
        let p1 = &source.fetch_all("Subject").unwrap()[0];

        let observations = source.related(p1, edge(&source, "observations")).unwrap();

        let ids: Vec<&Value> = observations.iter().map(|o| o.get("id").unwrap()).collect();
        assert_eq!(ids, vec![&json!(1), &json!(3)]);
    }

    #[test]
    fn test_local_join_null_yields_nothing() {
        let source = source();
        let subjects = source.fetch_all("Subject").unwrap();

        let site = source.related(&subjects[0], edge(&source, "site")).unwrap();
        let none = source.related(&subjects[1], edge(&source, "site")).unwrap();

        assert_eq!(site.len(), 1);
        assert_eq!(site[0].get("name"), Some(&json!("North")));
        assert!(none.is_empty());
    }

    #[test]
    fn test_through_join() {
        let source = source();
        let p1 = &source.fetch_all("Subject").unwrap()[0];

        let diagnoses = source.related(p1, edge(&source, "diagnoses")).unwrap();

        assert_eq!(diagnoses.len(), 1);
        assert_eq!(diagnoses[0].get("id"), Some(&json!("D2")));
    }

    #[test]
    fn test_stream_preserves_insertion_order_across_pages() {
        let source = source();

        let ids: Vec<Value> = source
            .stream("Observation", 2)
            .unwrap()
            .map(|r| r.unwrap().get("id").cloned().unwrap())
            .collect();

        assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);
    }

    #[test]
    fn test_insert_unknown_class_rejected() {
        let mut source = MemorySource::new(model());
        let err = source
            .insert(Instance::from_json("Nope", json!({})))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }
}
