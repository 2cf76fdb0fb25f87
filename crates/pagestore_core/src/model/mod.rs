//! Record and entity models.
//!
//! # Responsibility
//! - Define the schema-agnostic `Record` returned by the query executor.
//! - Define typed member/team entities projected from records.
//!
//! # Invariants
//! - Entities are plain values; mutating one never writes to the store.
//! - Audit timestamps are owned by the store and only read here.

pub mod member;
pub mod record;
pub mod team;
pub mod value;

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Creation/update timestamps maintained by the store (epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    pub created_at: i64,
    pub updated_at: i64,
}

impl AuditStamp {
    pub(crate) fn from_record(record: &record::Record) -> crate::query::QueryResult<Self> {
        Ok(Self {
            created_at: record.required_integer("created_at")?,
            updated_at: record.required_integer("updated_at")?,
        })
    }
}

/// Input validation failure for entity writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    BlankUsername,
    NegativeAge(i64),
    BlankTeamName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "username must not be blank"),
            Self::NegativeAge(age) => write!(f, "age must not be negative, got {age}"),
            Self::BlankTeamName => write!(f, "team name must not be blank"),
        }
    }
}

impl Error for ValidationError {}
