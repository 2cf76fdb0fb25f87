//! Static table schemas understood by the record store.
//!
//! # Responsibility
//! - Map logical field names to SQLite columns and fixed field kinds.
//! - Resolve field references for filter, sort and mutation compilation.
//!
//! # Invariants
//! - Every schema lists its primary key among `fields`.
//! - Generated fields (primary key, audit timestamps) are never written by
//!   callers; the store assigns them.

mod tables;

pub use tables::{ALL_TABLES, MEMBERS, TEAMS};

use crate::query::{QueryError, QueryResult};
use std::fmt::{Display, Formatter};

/// Fixed type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Unix epoch milliseconds.
    Timestamp,
    /// Foreign key pointing at the primary key of `table`.
    Reference { table: &'static str },
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Reference { table } => write!(f, "reference({table})"),
        }
    }
}

/// Whether callers may write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Writable,
    Generated,
}

/// One named field and its backing column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub access: FieldAccess,
}

impl FieldDef {
    pub const fn writable(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            access: FieldAccess::Writable,
        }
    }

    pub const fn generated(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            access: FieldAccess::Generated,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.access == FieldAccess::Writable
    }
}

/// Static description of one table.
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    /// SQLite table name; also used as cache namespace.
    pub table: &'static str,
    /// Logical name of the primary key field.
    pub primary_key: &'static str,
    pub fields: &'static [FieldDef],
    /// Column refreshed with the current time on every update, if audited.
    pub updated_at_column: Option<&'static str>,
}

impl TableSchema {
    /// Resolves a logical field name.
    ///
    /// # Errors
    /// - `QueryError::UnknownField` when the table has no such field.
    pub fn field(&self, name: &str) -> QueryResult<&FieldDef> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| QueryError::UnknownField {
                table: self.table,
                field: name.to_string(),
            })
    }

    /// Primary key definition.
    pub fn primary_key_field(&self) -> &FieldDef {
        self.fields
            .iter()
            .find(|field| field.name == self.primary_key)
            .unwrap_or(&self.fields[0])
    }

    pub fn primary_key_column(&self) -> &'static str {
        self.primary_key_field().column
    }

    /// Non-key fields in declaration order.
    pub fn value_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(move |field| field.name != self.primary_key)
    }
}
