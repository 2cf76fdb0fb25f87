//! Member entity and its projections.
//!
//! # Invariants
//! - `username` is never blank and `age` is never negative on write paths.
//! - `team_id` is the only link to a team; the team itself is fetched
//!   explicitly (see `MemberWithTeam`).

use crate::model::record::{Record, RecordId};
use crate::model::team::{Team, TeamId};
use crate::model::value::FieldValue;
use crate::model::{AuditStamp, ValidationError};
use crate::query::{QueryError, QueryResult};
use serde::Serialize;

pub type MemberId = RecordId;

/// Persisted member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub username: String,
    pub age: i64,
    pub team_id: Option<TeamId>,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl TryFrom<Record> for Member {
    type Error = QueryError;

    fn try_from(record: Record) -> QueryResult<Self> {
        Self::try_from(&record)
    }
}

impl TryFrom<&Record> for Member {
    type Error = QueryError;

    fn try_from(record: &Record) -> QueryResult<Self> {
        let username = record
            .text("username")?
            .ok_or_else(|| QueryError::InvalidData("members.username is null".to_string()))?
            .to_string();
        Ok(Self {
            id: record.id,
            username,
            age: record.required_integer("age")?,
            team_id: record.integer("team_id")?,
            audit: AuditStamp::from_record(record)?,
        })
    }
}

/// Write model for inserting a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub username: String,
    pub age: i64,
    pub team_id: Option<TeamId>,
}

impl NewMember {
    pub fn new(username: impl Into<String>, age: i64) -> Self {
        Self {
            username: username.into(),
            age,
            team_id: None,
        }
    }

    pub fn in_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        if self.age < 0 {
            return Err(ValidationError::NegativeAge(self.age));
        }
        Ok(())
    }

    pub(crate) fn to_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("username", FieldValue::from(self.username.as_str())),
            ("age", FieldValue::Integer(self.age)),
            ("team_id", self.team_id.map_or(FieldValue::Null, FieldValue::Reference)),
        ]
    }
}

pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::BlankUsername);
    }
    Ok(())
}

/// Member with its team loaded in the same call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberWithTeam {
    pub member: Member,
    pub team: Option<Team>,
}

/// Outward-facing member projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: MemberId,
    pub username: String,
    pub team_name: Option<String>,
}

impl MemberDto {
    pub fn from_member(member: &Member, team: Option<&Team>) -> Self {
        Self {
            id: member.id,
            username: member.username.clone(),
            team_name: team.map(|team| team.name.clone()),
        }
    }
}

impl From<&MemberWithTeam> for MemberDto {
    fn from(value: &MemberWithTeam) -> Self {
        Self::from_member(&value.member, value.team.as_ref())
    }
}
