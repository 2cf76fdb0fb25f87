//! SQLite-backed `RecordStore`.
//!
//! # Invariants
//! - Every call borrows exactly one pooled connection and returns it on drop.
//! - Required tables are verified once, when the store is built.

use super::{verify_schema, RecordStore};
use crate::db::ConnectionPool;
use crate::model::record::{Record, RecordId};
use crate::model::value::FieldValue;
use crate::query::sql::{self, Statement};
use crate::query::{FilterSpec, Mutation, QueryError, QueryResult, RowBounds, SortSpec};
use crate::schema::{TableSchema, ALL_TABLES};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::sync::Arc;

/// Record store over a shared connection pool.
pub struct SqliteRecordStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteRecordStore {
    /// Builds the store after checking every known table.
    ///
    /// # Errors
    /// - `QueryError::StoreUnavailable` when no connection can be borrowed.
    /// - `QueryError::MissingRequiredTable` / `MissingRequiredColumn`.
    pub fn try_new(pool: Arc<ConnectionPool>) -> QueryResult<Self> {
        {
            let conn = pool.acquire()?;
            for schema in ALL_TABLES {
                verify_schema(&conn, schema)?;
            }
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    fn execute(&self, statement: Statement) -> QueryResult<usize> {
        let conn = self.pool.acquire()?;
        let changed = conn.execute(&statement.sql, params_from_iter(statement.binds.iter()))?;
        Ok(changed)
    }
}

impl RecordStore for SqliteRecordStore {
    fn select(
        &self,
        schema: &TableSchema,
        filter: &FilterSpec,
        sort: &SortSpec,
        bounds: Option<RowBounds>,
    ) -> QueryResult<Vec<Record>> {
        let statement = sql::select(schema, filter, sort, bounds)?;
        let conn = self.pool.acquire()?;
        query_records(&conn, schema, &statement)
    }

    fn count(&self, schema: &TableSchema, filter: &FilterSpec) -> QueryResult<u64> {
        let statement = sql::count(schema, filter)?;
        let conn = self.pool.acquire()?;
        let count: i64 = conn.query_row(
            &statement.sql,
            params_from_iter(statement.binds.iter()),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| QueryError::InvalidData(format!("negative row count {count}")))
    }

    fn update_where(
        &self,
        schema: &TableSchema,
        filter: &FilterSpec,
        mutation: &Mutation,
    ) -> QueryResult<usize> {
        self.execute(sql::update(schema, filter, mutation)?)
    }

    fn insert(
        &self,
        schema: &TableSchema,
        values: &[(&str, FieldValue)],
    ) -> QueryResult<RecordId> {
        let statement = sql::insert(schema, values)?;
        let conn = self.pool.acquire()?;
        conn.execute(&statement.sql, params_from_iter(statement.binds.iter()))?;
        Ok(conn.last_insert_rowid())
    }

    fn delete_where(&self, schema: &TableSchema, filter: &FilterSpec) -> QueryResult<usize> {
        self.execute(sql::delete(schema, filter)?)
    }
}

fn query_records(
    conn: &Connection,
    schema: &TableSchema,
    statement: &Statement,
) -> QueryResult<Vec<Record>> {
    let mut stmt = conn.prepare(&statement.sql)?;
    let mut rows = stmt.query(params_from_iter(statement.binds.iter()))?;

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_record_row(row, schema)?);
    }
    Ok(records)
}

/// Decodes one row selected with `sql::select_list(schema)`.
fn parse_record_row(row: &Row<'_>, schema: &TableSchema) -> QueryResult<Record> {
    let primary_key = schema.primary_key_field();
    let mut id = None;
    let mut record_fields = Vec::with_capacity(schema.fields.len());

    for (index, field) in schema.fields.iter().enumerate() {
        let raw: Value = row.get(index)?;
        if field.name == primary_key.name {
            match raw {
                Value::Integer(value) => id = Some(value),
                other => {
                    return Err(QueryError::InvalidData(format!(
                        "{}.{} holds non-integer key {other:?}",
                        schema.table, field.column
                    )))
                }
            }
            continue;
        }

        let value = FieldValue::from_sql_value(raw.clone(), field.kind).ok_or_else(|| {
            QueryError::InvalidData(format!(
                "{}.{} holds {raw:?}, expected {}",
                schema.table, field.column, field.kind
            ))
        })?;
        record_fields.push((field.name, value));
    }

    let id = id.ok_or_else(|| {
        QueryError::InvalidData(format!("{} row without primary key", schema.table))
    })?;
    Ok(record_fields
        .into_iter()
        .fold(Record::new(id), |record, (name, value)| {
            record.with_field(name, value)
        }))
}

#[cfg(test)]
mod tests {
    use super::SqliteRecordStore;
    use crate::db::{ConnectionPool, PoolOptions};
    use crate::model::value::FieldValue;
    use crate::query::{FilterSpec, Mutation, QueryError, SortSpec};
    use crate::schema::{MEMBERS, TEAMS};
    use crate::store::RecordStore;
    use std::sync::Arc;

    fn store() -> SqliteRecordStore {
        let pool = ConnectionPool::in_memory(PoolOptions::default()).unwrap();
        SqliteRecordStore::try_new(Arc::new(pool)).unwrap()
    }

    #[test]
    fn insert_assigns_monotonic_ids_and_audit_columns() {
        let store = store();
        let first = store
            .insert(&TEAMS, &[("name", FieldValue::from("teamA"))])
            .unwrap();
        let second = store
            .insert(&TEAMS, &[("name", FieldValue::from("teamB"))])
            .unwrap();
        assert!(second > first);

        let rows = store
            .select(&TEAMS, &FilterSpec::all(), &SortSpec::unsorted(), None)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, first);
        assert!(matches!(
            rows[0].get("created_at"),
            Some(FieldValue::Timestamp(_))
        ));
    }

    #[test]
    fn null_reference_round_trips_as_null() {
        let store = store();
        let id = store
            .insert(
                &MEMBERS,
                &[
                    ("username", FieldValue::from("solo")),
                    ("age", FieldValue::from(3)),
                ],
            )
            .unwrap();
        let rows = store
            .select(
                &MEMBERS,
                &FilterSpec::all().eq("team_id", FieldValue::Null),
                &SortSpec::unsorted(),
                None,
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].get("team_id"), Some(&FieldValue::Null));
    }

    #[test]
    fn update_and_delete_report_affected_rows() {
        let store = store();
        for age in [10, 20, 30] {
            store
                .insert(
                    &MEMBERS,
                    &[
                        ("username", FieldValue::from(format!("m{age}"))),
                        ("age", FieldValue::from(age)),
                    ],
                )
                .unwrap();
        }

        let updated = store
            .update_where(
                &MEMBERS,
                &FilterSpec::all().ge("age", 20),
                &Mutation::new().add("age", 1),
            )
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(
            store
                .count(&MEMBERS, &FilterSpec::all().in_set("age", [21, 31]))
                .unwrap(),
            2
        );

        let deleted = store
            .delete_where(&MEMBERS, &FilterSpec::all().lt("age", 15))
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count(&MEMBERS, &FilterSpec::all()).unwrap(), 2);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let store = store();
        let err = store
            .insert(
                &MEMBERS,
                &[
                    ("username", FieldValue::from("ghost")),
                    ("age", FieldValue::from(1)),
                    ("team_id", FieldValue::Reference(999)),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, QueryError::Db(_)));
    }
}
