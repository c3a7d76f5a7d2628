use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One row of an entity class
///
/// Instances are read-only snapshots handed out by a row source. They
/// serialize as their plain column map, which is what templates see.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class_name: String,
    fields: Map<String, Value>,
}

impl Instance {
    pub fn new(class_name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            class_name: class_name.into(),
            fields,
        }
    }

    /// Build an instance from a JSON object literal
    ///
    /// Non-object values produce an instance without fields.
    pub fn from_json(class_name: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(class_name, fields)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Field access by name; `None` when the column is absent
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Like [`get`](Self::get) but treats SQL `NULL` as absent
    pub fn get_non_null(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Column map as a JSON object (the value bound into templates)
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Human-readable identity for logs: `Class(key)`
    pub fn describe(&self, primary_key: &str) -> String {
        match self.get(primary_key) {
            Some(Value::String(s)) => format!("{}({})", self.class_name, s),
            Some(v) => format!("{}({})", self.class_name, v),
            None => format!("{}(?)", self.class_name),
        }
    }
}

impl Serialize for Instance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}
