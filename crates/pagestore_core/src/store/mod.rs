//! Record store seam between the query executor and persistence.
//!
//! # Responsibility
//! - Define the narrow storage contract the executor depends on.
//! - Verify that a connected database carries the tables the schemas describe.
//!
//! # Invariants
//! - Store methods receive already-validated specs; they still resolve them and
//!   never interpolate caller values into SQL.
//! - Rows come back with every schema field present (nulls included).

use crate::model::record::{Record, RecordId};
use crate::model::value::FieldValue;
use crate::query::{FilterSpec, Mutation, QueryError, QueryResult, RowBounds, SortSpec};
use crate::schema::TableSchema;
use rusqlite::Connection;

mod sqlite;

pub use sqlite::SqliteRecordStore;

/// Storage operations used by `QueryExecutor`.
pub trait RecordStore {
    /// Filtered, ordered select; `None` bounds means every matching row.
    fn select(
        &self,
        schema: &TableSchema,
        filter: &FilterSpec,
        sort: &SortSpec,
        bounds: Option<RowBounds>,
    ) -> QueryResult<Vec<Record>>;
    /// Number of rows matching `filter`.
    fn count(&self, schema: &TableSchema, filter: &FilterSpec) -> QueryResult<u64>;
    /// One set-based `UPDATE`; returns affected rows.
    fn update_where(
        &self,
        schema: &TableSchema,
        filter: &FilterSpec,
        mutation: &Mutation,
    ) -> QueryResult<usize>;
    /// Inserts one row and returns its assigned primary key.
    fn insert(&self, schema: &TableSchema, values: &[(&str, FieldValue)])
        -> QueryResult<RecordId>;
    /// Deletes matching rows; returns affected rows.
    fn delete_where(&self, schema: &TableSchema, filter: &FilterSpec) -> QueryResult<usize>;
}

/// Checks that `schema`'s table and every mapped column exist.
///
/// # Errors
/// - `QueryError::MissingRequiredTable` / `MissingRequiredColumn` when the
///   database predates the schema.
pub fn verify_schema(conn: &Connection, schema: &TableSchema) -> QueryResult<()> {
    if !table_exists(conn, schema.table)? {
        return Err(QueryError::MissingRequiredTable(schema.table));
    }
    for field in schema.fields {
        if !table_has_column(conn, schema.table, field.column)? {
            return Err(QueryError::MissingRequiredColumn {
                table: schema.table,
                column: field.column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> QueryResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> QueryResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::verify_schema;
    use crate::db::open_db_in_memory;
    use crate::query::QueryError;
    use crate::schema::{ALL_TABLES, MEMBERS};
    use rusqlite::Connection;

    #[test]
    fn migrated_database_satisfies_every_schema() {
        let conn = open_db_in_memory().unwrap();
        for schema in ALL_TABLES {
            verify_schema(&conn, schema).unwrap();
        }
    }

    #[test]
    fn missing_table_and_column_are_reported() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            verify_schema(&conn, &MEMBERS),
            Err(QueryError::MissingRequiredTable("members"))
        ));

        conn.execute_batch("CREATE TABLE members (member_id INTEGER PRIMARY KEY, username TEXT);")
            .unwrap();
        assert!(matches!(
            verify_schema(&conn, &MEMBERS),
            Err(QueryError::MissingRequiredColumn {
                table: "members",
                column: "age"
            })
        ));
    }
}
