//! Team entity.

use crate::model::record::{Record, RecordId};
use crate::model::{AuditStamp, ValidationError};
use crate::query::{QueryError, QueryResult};
use serde::Serialize;

pub type TeamId = RecordId;

/// Persisted team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl TryFrom<&Record> for Team {
    type Error = QueryError;

    fn try_from(record: &Record) -> QueryResult<Self> {
        let name = record
            .text("name")?
            .ok_or_else(|| QueryError::InvalidData("teams.name is null".to_string()))?
            .to_string();
        Ok(Self {
            id: record.id,
            name,
            audit: AuditStamp::from_record(record)?,
        })
    }
}

impl TryFrom<Record> for Team {
    type Error = QueryError;

    fn try_from(record: Record) -> QueryResult<Self> {
        Self::try_from(&record)
    }
}

pub(crate) fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::BlankTeamName);
    }
    Ok(())
}
