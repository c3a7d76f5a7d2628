//! SQLite-backed row source
//!
//! Rows are read with `SELECT *` and converted column by column into JSON
//! values: integers and reals become numbers, text stays text, blobs become
//! lower-case hex strings. Every query orders by the class's primary key.

#![allow(clippy::result_large_err)]

use crate::db::{qualified_table, quote_ident};
use crate::errors::{query_failed, unknown_class, Result};
use projector_core::model::{Cardinality, Edge, EntityClass, Instance, Join, ModelSchema};
use projector_core::source::{InstanceStream, RowSource, SourceResult};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Map, Number, Value};
use std::collections::VecDeque;

/// Row source over one SQLite connection
pub struct SqliteSource {
    conn: Connection,
    model: ModelSchema,
}

impl std::fmt::Debug for SqliteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSource")
            .field("classes", &self.model.classes().count())
            .field("schema", &self.model.schema())
            .finish()
    }
}

impl SqliteSource {
    pub fn new(conn: Connection, model: ModelSchema) -> Self {
        Self { conn, model }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn class(&self, class_name: &str) -> Result<&EntityClass> {
        self.model
            .class(class_name)
            .map_err(|_| unknown_class(class_name))
    }

    fn table(&self, class: &EntityClass) -> String {
        qualified_table(self.model.schema(), &class.table)
    }

    /// Run a query and convert every row into an instance of `class`
    fn query(&self, class: &EntityClass, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Instance>> {
        Ok(self
            .query_keyed(class, sql, params)?
            .into_iter()
            .map(|(instance, _)| instance)
            .collect())
    }

    /// Like `query`, also returning each row's primary-key value
    fn query_keyed(
        &self,
        class: &EntityClass,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<(Instance, SqlValue)>> {
        tracing::trace!(class = %class.name, sql = %sql, "Executing query");
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| query_failed(&class.name, e))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let pk_index = columns.iter().position(|c| c == &class.primary_key);

        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                let instance = row_to_instance(&class.name, &columns, row)?;
                let key = match pk_index {
                    Some(i) => row.get::<_, SqlValue>(i)?,
                    None => SqlValue::Null,
                };
                Ok((instance, key))
            })
            .map_err(|e| query_failed(&class.name, e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| query_failed(&class.name, e))
    }

    fn fetch_page(
        &self,
        class: &EntityClass,
        after: Option<&SqlValue>,
        page_size: usize,
    ) -> Result<Vec<(Instance, SqlValue)>> {
        let table = self.table(class);
        let pk = quote_ident(&class.primary_key);
        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
        match after {
            Some(last) => self.query_keyed(
                class,
                &format!("SELECT * FROM {table} WHERE {pk} > ?1 ORDER BY {pk} LIMIT ?2"),
                vec![last.clone(), SqlValue::Integer(limit)],
            ),
            None => self.query_keyed(
                class,
                &format!("SELECT * FROM {table} ORDER BY {pk} LIMIT ?1"),
                vec![SqlValue::Integer(limit)],
            ),
        }
    }
}

impl RowSource for SqliteSource {
    fn model(&self) -> &ModelSchema {
        &self.model
    }

    fn fetch_all(&self, class_name: &str) -> SourceResult<Vec<Instance>> {
        let class = self.class(class_name)?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            self.table(class),
            quote_ident(&class.primary_key)
        );
        self.query(class, &sql, Vec::new())
    }

    fn stream<'a>(
        &'a self,
        class_name: &str,
        page_size: usize,
    ) -> SourceResult<InstanceStream<'a>> {
        let class = self.class(class_name)?;
        Ok(Box::new(KeysetStream {
            source: self,
            class,
            page_size: page_size.max(1),
            page: VecDeque::new(),
            last_key: None,
            exhausted: false,
        }))
    }

    fn related(&self, instance: &Instance, edge: &Edge) -> SourceResult<Vec<Instance>> {
        let owner = self.class(instance.class_name())?;
        let target = self.class(&edge.target)?;
        let table = self.table(target);
        let pk = quote_ident(&target.primary_key);
        let limit = match edge.cardinality {
            Cardinality::Singular => " LIMIT 1",
            Cardinality::Collection => "",
        };

        let (sql, key) = match &edge.join {
            Join::Local { column } => (
                format!("SELECT * FROM {table} WHERE {pk} = ?1 ORDER BY {pk}{limit}"),
                instance.get_non_null(column),
            ),
            Join::Remote { column } => (
                format!(
                    "SELECT * FROM {table} WHERE {} = ?1 ORDER BY {pk}{limit}",
                    quote_ident(column)
                ),
                instance.get_non_null(&owner.primary_key),
            ),
            Join::Through {
                table: link_table,
                local,
                remote,
            } => (
                format!(
                    "SELECT t.* FROM {table} AS t JOIN {} AS l ON l.{} = t.{pk} \
                     WHERE l.{} = ?1 ORDER BY t.{pk}{limit}",
                    qualified_table(self.model.schema(), link_table),
                    quote_ident(remote),
                    quote_ident(local)
                ),
                instance.get_non_null(&owner.primary_key),
            ),
        };

        match key {
            Some(key) => self.query(target, &sql, vec![json_to_sql(key)]),
            None => Ok(Vec::new()),
        }
    }
}

/// Lazy class scan pulling one page at a time
struct KeysetStream<'a> {
    source: &'a SqliteSource,
    class: &'a EntityClass,
    page_size: usize,
    page: VecDeque<Instance>,
    last_key: Option<SqlValue>,
    exhausted: bool,
}

impl Iterator for KeysetStream<'_> {
    type Item = SourceResult<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            match self
                .source
                .fetch_page(self.class, self.last_key.as_ref(), self.page_size)
            {
                Ok(rows) => {
                    if rows.len() < self.page_size {
                        self.exhausted = true;
                    }
                    if let Some((_, key)) = rows.last() {
                        self.last_key = Some(key.clone());
                    }
                    tracing::debug!(class = %self.class.name, rows = rows.len(), "Fetched page");
                    self.page.extend(rows.into_iter().map(|(instance, _)| instance));
                }
                Err(err) => {
                    self.exhausted = true;
                    return Some(Err(err));
                }
            }
        }
        self.page.pop_front().map(Ok)
    }
}

fn row_to_instance(class_name: &str, columns: &[String], row: &Row<'_>) -> rusqlite::Result<Instance> {
    let mut fields = Map::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        fields.insert(column.clone(), sql_to_json(row.get_ref(i)?));
    }
    Ok(Instance::new(class_name, fields))
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sql_to_json_conversions() {
        assert_eq!(sql_to_json(ValueRef::Null), Value::Null);
        assert_eq!(sql_to_json(ValueRef::Integer(7)), json!(7));
        assert_eq!(sql_to_json(ValueRef::Real(1.5)), json!(1.5));
        assert_eq!(sql_to_json(ValueRef::Text(b"abc")), json!("abc"));
        assert_eq!(sql_to_json(ValueRef::Blob(&[0xde, 0xad])), json!("dead"));
    }

    #[test]
    fn test_json_to_sql_keys() {
        assert_eq!(json_to_sql(&json!(3)), SqlValue::Integer(3));
        assert_eq!(json_to_sql(&json!("P1")), SqlValue::Text("P1".to_string()));
        assert_eq!(json_to_sql(&json!(true)), SqlValue::Integer(1));
    }
}
