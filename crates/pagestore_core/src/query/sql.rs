//! Compiles query specs into SQLite statements with positional binds.
//!
//! # Invariants
//! - Only schema column names are interpolated; every value is a bind.
//! - Bind order matches placeholder order (SET binds before WHERE binds).

use crate::model::value::FieldValue;
use crate::query::filter::{coerce, ResolvedPredicate};
use crate::query::mutation::ResolvedAssignment;
use crate::query::{Comparator, FilterSpec, Mutation, QueryError, QueryResult, RowBounds, SortSpec};
use crate::schema::TableSchema;
use rusqlite::types::Value;

/// Current time in epoch milliseconds.
pub(crate) const NOW_MILLIS_SQL: &str =
    "CAST(ROUND((julianday('now') - 2440587.5) * 86400000) AS INTEGER)";

/// SQL text plus its bind values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

pub(crate) fn select_list(schema: &TableSchema) -> String {
    schema
        .fields
        .iter()
        .map(|field| field.column)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn select(
    schema: &TableSchema,
    filter: &FilterSpec,
    sort: &SortSpec,
    bounds: Option<RowBounds>,
) -> QueryResult<Statement> {
    let predicates = filter.resolve(schema)?;
    let ordering = sort.resolve(schema)?;

    let mut sql = format!("SELECT {} FROM {}", select_list(schema), schema.table);
    let mut binds = Vec::new();
    push_where(&mut sql, &mut binds, &predicates);

    let order_terms = ordering
        .iter()
        .map(|(column, direction)| format!("{column} {}", direction.as_sql()))
        .collect::<Vec<_>>();
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_terms.join(", "));

    if let Some(bounds) = bounds {
        sql.push_str(" LIMIT ? OFFSET ?");
        binds.push(Value::Integer(bounds.limit));
        binds.push(Value::Integer(bounds.offset));
    }

    Ok(Statement { sql, binds })
}

pub(crate) fn count(schema: &TableSchema, filter: &FilterSpec) -> QueryResult<Statement> {
    let predicates = filter.resolve(schema)?;
    let mut sql = format!("SELECT COUNT(*) FROM {}", schema.table);
    let mut binds = Vec::new();
    push_where(&mut sql, &mut binds, &predicates);
    Ok(Statement { sql, binds })
}

pub(crate) fn update(
    schema: &TableSchema,
    filter: &FilterSpec,
    mutation: &Mutation,
) -> QueryResult<Statement> {
    let assignments = mutation.resolve(schema)?;
    let predicates = filter.resolve(schema)?;

    let mut binds = Vec::new();
    let mut set_terms = assignments
        .iter()
        .map(|assignment| match assignment {
            ResolvedAssignment::Set { column, value } => {
                binds.push(value.to_sql_value());
                format!("{column} = ?")
            }
            ResolvedAssignment::Add { column, delta } => {
                binds.push(Value::Integer(*delta));
                format!("{column} = {column} + ?")
            }
        })
        .collect::<Vec<_>>();
    if let Some(column) = schema.updated_at_column {
        set_terms.push(format!("{column} = {NOW_MILLIS_SQL}"));
    }

    let mut sql = format!("UPDATE {} SET {}", schema.table, set_terms.join(", "));
    push_where(&mut sql, &mut binds, &predicates);
    Ok(Statement { sql, binds })
}

pub(crate) fn delete(schema: &TableSchema, filter: &FilterSpec) -> QueryResult<Statement> {
    let predicates = filter.resolve(schema)?;
    let mut sql = format!("DELETE FROM {}", schema.table);
    let mut binds = Vec::new();
    push_where(&mut sql, &mut binds, &predicates);
    Ok(Statement { sql, binds })
}

pub(crate) fn insert(
    schema: &TableSchema,
    values: &[(&str, FieldValue)],
) -> QueryResult<Statement> {
    if values.is_empty() {
        return Ok(Statement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", schema.table),
            binds: Vec::new(),
        });
    }

    let mut columns = Vec::with_capacity(values.len());
    let mut binds = Vec::with_capacity(values.len());
    for (name, value) in values {
        let field = schema.field(name)?;
        if !field.is_writable() {
            return Err(QueryError::InvalidMutation(format!(
                "field `{}` is generated by the store",
                field.name
            )));
        }
        if columns.contains(&field.column) {
            return Err(QueryError::InvalidMutation(format!(
                "field `{}` is assigned more than once",
                field.name
            )));
        }
        columns.push(field.column);
        binds.push(coerce(field, value.clone(), true)?.to_sql_value());
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            schema.table,
            columns.join(", ")
        ),
        binds,
    })
}

fn push_where(sql: &mut String, binds: &mut Vec<Value>, predicates: &[ResolvedPredicate]) {
    if predicates.is_empty() {
        return;
    }

    let terms = predicates
        .iter()
        .map(|predicate| predicate_sql(predicate, binds))
        .collect::<Vec<_>>();
    sql.push_str(" WHERE ");
    sql.push_str(&terms.join(" AND "));
}

fn predicate_sql(predicate: &ResolvedPredicate, binds: &mut Vec<Value>) -> String {
    let column = predicate.column;
    match &predicate.comparator {
        Comparator::Eq(FieldValue::Null) => format!("{column} IS NULL"),
        Comparator::Eq(value) => bind_compare(binds, column, "=", value),
        Comparator::Gt(value) => bind_compare(binds, column, ">", value),
        Comparator::Ge(value) => bind_compare(binds, column, ">=", value),
        Comparator::Lt(value) => bind_compare(binds, column, "<", value),
        Comparator::Le(value) => bind_compare(binds, column, "<=", value),
        Comparator::In(values) if values.is_empty() => "0 = 1".to_string(),
        Comparator::In(values) => {
            binds.extend(values.iter().map(FieldValue::to_sql_value));
            format!("{column} IN ({})", vec!["?"; values.len()].join(", "))
        }
    }
}

fn bind_compare(binds: &mut Vec<Value>, column: &str, op: &str, value: &FieldValue) -> String {
    binds.push(value.to_sql_value());
    format!("{column} {op} ?")
}

#[cfg(test)]
mod tests {
    use super::{count, insert, select, update, NOW_MILLIS_SQL};
    use crate::model::value::FieldValue;
    use crate::query::{FilterSpec, Mutation, RowBounds, SortSpec};
    use crate::schema::MEMBERS;
    use rusqlite::types::Value;

    #[test]
    fn select_compiles_filter_sort_and_bounds() {
        let statement = select(
            &MEMBERS,
            &FilterSpec::all().eq("age", 10),
            &SortSpec::desc("username"),
            Some(RowBounds {
                offset: 3,
                limit: 4,
            }),
        )
        .unwrap();

        assert_eq!(
            statement.sql,
            "SELECT member_id, username, age, team_id, created_at, updated_at FROM members \
             WHERE age = ? ORDER BY username DESC, member_id ASC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            statement.binds,
            vec![Value::Integer(10), Value::Integer(4), Value::Integer(3)]
        );
    }

    #[test]
    fn null_equality_and_empty_membership_compile_without_binds() {
        let statement = count(
            &MEMBERS,
            &FilterSpec::all()
                .eq("team_id", FieldValue::Null)
                .in_set("username", Vec::<String>::new()),
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM members WHERE team_id IS NULL AND 0 = 1"
        );
        assert!(statement.binds.is_empty());
    }

    #[test]
    fn update_binds_set_values_before_where_values() {
        let statement = update(
            &MEMBERS,
            &FilterSpec::all().ge("age", 20),
            &Mutation::new().add("age", 1),
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            format!("UPDATE members SET age = age + ?, updated_at = {NOW_MILLIS_SQL} WHERE age >= ?")
        );
        assert_eq!(statement.binds, vec![Value::Integer(1), Value::Integer(20)]);
    }

    #[test]
    fn insert_rejects_generated_fields() {
        assert!(insert(&MEMBERS, &[("created_at", FieldValue::Timestamp(1))]).is_err());

        let statement = insert(
            &MEMBERS,
            &[("username", FieldValue::from("a")), ("age", FieldValue::from(3))],
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO members (username, age) VALUES (?, ?)"
        );
    }
}
