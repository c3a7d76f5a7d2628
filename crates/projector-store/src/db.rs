//! Database connection management
//!
//! Provides utilities for opening SQLite connections and attaching the
//! databases that back a schema-qualified model

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    Connection::open(path).map_err(|e| from_rusqlite(e).with_path(path))
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Attach another database file under `schema`
///
/// Tables in it are then addressed as `"schema"."table"`.
pub fn attach<P: AsRef<Path>>(conn: &Connection, path: P, schema: &str) -> Result<()> {
    let path = path.as_ref();
    conn.execute(
        "ATTACH DATABASE ?1 AS ?2",
        [path.to_string_lossy().as_ref(), schema],
    )
    .map_err(|e| from_rusqlite(e).with_op("attach").with_path(path))?;
    Ok(())
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Table reference, schema-qualified when a schema is given
pub fn qualified_table(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(table)),
        None => quote_ident(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("study"), "\"study\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_qualified_table() {
        assert_eq!(qualified_table(None, "tgt_study"), "\"tgt_study\"");
        assert_eq!(
            qualified_table(Some("target"), "tgt_study"),
            "\"target\".\"tgt_study\""
        );
    }

    #[test]
    fn test_attach_in_memory() {
        let conn = open_in_memory().unwrap();
        attach(&conn, ":memory:", "other").unwrap();
        conn.execute("CREATE TABLE other.t (id INTEGER)", []).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM other.t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
