//! Typed field values carried by records, filters and mutations.

use crate::model::record::RecordId;
use crate::schema::FieldKind;
use rusqlite::types::Value;
use serde::Serialize;

/// One field value. Serializes as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    /// Unix epoch milliseconds.
    Timestamp(i64),
    Reference(RecordId),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Numeric payload of integer, timestamp and reference values.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) | Self::Timestamp(value) | Self::Reference(value) => Some(*value),
            _ => None,
        }
    }

    /// Converts this value to the representation of `kind`.
    ///
    /// Plain integers are accepted for timestamp and reference fields so
    /// builder calls like `eq("team_id", 3)` work. Returns `None` when the
    /// value cannot represent `kind`.
    pub fn coerce_to(self, kind: FieldKind) -> Option<Self> {
        match (self, kind) {
            (Self::Null, _) => Some(Self::Null),
            (Self::Text(value), FieldKind::Text) => Some(Self::Text(value)),
            (Self::Integer(value), FieldKind::Integer) => Some(Self::Integer(value)),
            (Self::Integer(value) | Self::Timestamp(value), FieldKind::Timestamp) => {
                Some(Self::Timestamp(value))
            }
            (Self::Integer(value) | Self::Reference(value), FieldKind::Reference { .. }) => {
                Some(Self::Reference(value))
            }
            _ => None,
        }
    }

    pub(crate) fn to_sql_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(value) => Value::Text(value.clone()),
            Self::Integer(value) | Self::Timestamp(value) | Self::Reference(value) => {
                Value::Integer(*value)
            }
        }
    }

    /// Decodes a raw SQLite value stored in a column of `kind`.
    pub(crate) fn from_sql_value(value: Value, kind: FieldKind) -> Option<Self> {
        match (value, kind) {
            (Value::Null, _) => Some(Self::Null),
            (Value::Text(text), FieldKind::Text) => Some(Self::Text(text)),
            (Value::Integer(number), FieldKind::Integer) => Some(Self::Integer(number)),
            (Value::Integer(number), FieldKind::Timestamp) => Some(Self::Timestamp(number)),
            (Value::Integer(number), FieldKind::Reference { .. }) => Some(Self::Reference(number)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
