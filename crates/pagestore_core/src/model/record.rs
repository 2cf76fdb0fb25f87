//! Schema-agnostic row model returned by the query executor.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused within one table.
//! - `fields` holds every non-key field of the row's schema, including nulls.

use crate::model::value::FieldValue;
use crate::query::{QueryError, QueryResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Auto-assigned, monotonic primary key.
pub type RecordId = i64;

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Text value of a field; `None` when the stored value is null.
    pub fn text(&self, field: &str) -> QueryResult<Option<&str>> {
        match self.present(field)? {
            FieldValue::Null => Ok(None),
            FieldValue::Text(value) => Ok(Some(value.as_str())),
            other => Err(wrong_shape(field, "text", other)),
        }
    }

    /// Integer-like value (integer, timestamp, reference); `None` for null.
    pub fn integer(&self, field: &str) -> QueryResult<Option<i64>> {
        let value = self.present(field)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_integer()
            .map(Some)
            .ok_or_else(|| wrong_shape(field, "integer", value))
    }

    /// Integer-like value that must not be null.
    pub fn required_integer(&self, field: &str) -> QueryResult<i64> {
        self.integer(field)?
            .ok_or_else(|| QueryError::InvalidData(format!("field `{field}` is unexpectedly null")))
    }

    fn present(&self, field: &str) -> QueryResult<&FieldValue> {
        self.fields
            .get(field)
            .ok_or_else(|| QueryError::InvalidData(format!("record {} has no field `{field}`", self.id)))
    }
}

fn wrong_shape(field: &str, expected: &str, actual: &FieldValue) -> QueryError {
    QueryError::InvalidData(format!(
        "field `{field}` holds {actual:?}, expected {expected}"
    ))
}

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::model::value::FieldValue;

    #[test]
    fn typed_accessors_read_values_and_nulls() {
        let record = Record::new(7)
            .with_field("username", "member1")
            .with_field("age", 10)
            .with_field("team_id", FieldValue::Null);

        assert_eq!(record.text("username").unwrap(), Some("member1"));
        assert_eq!(record.required_integer("age").unwrap(), 10);
        assert_eq!(record.integer("team_id").unwrap(), None);
    }

    #[test]
    fn accessors_reject_missing_and_mistyped_fields() {
        let record = Record::new(1).with_field("age", "ten");
        assert!(record.integer("age").is_err());
        assert!(record.text("username").is_err());
        assert!(record.required_integer("age").is_err());
    }
}
