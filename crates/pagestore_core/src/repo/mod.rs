//! Member and team repositories over the query executor.
//!
//! # Responsibility
//! - Express the member/team use-case queries as filter/sort/window specs.
//! - Convert schema-agnostic records into typed entities.
//!
//! # Invariants
//! - Write paths validate entity input before any store call.
//! - Associations are loaded explicitly with one batched `IN` query; nothing
//!   is fetched lazily behind the caller's back.
//! - Repository APIs return semantic errors (`NotFound`, `NonUniqueResult`)
//!   in addition to query/store errors.

use crate::model::record::RecordId;
use crate::model::ValidationError;
use crate::query::QueryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod member_repo;
pub mod team_repo;

pub use member_repo::{ExecutorMemberRepository, MemberRepository};
pub use team_repo::{ExecutorTeamRepository, TeamRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for member/team repository operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound {
        table: &'static str,
        id: RecordId,
    },
    /// A single-result lookup matched more than one record.
    NonUniqueResult {
        table: &'static str,
        field: &'static str,
    },
    Query(QueryError),
}

impl RepoError {
    /// Whether the store could not be reached; the request itself was fine.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Query(QueryError::StoreUnavailable(_)))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "{table} record not found: {id}"),
            Self::NonUniqueResult { table, field } => write!(
                f,
                "expected at most one {table} record for `{field}`, found several"
            ),
            Self::Query(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::NotFound { .. } | Self::NonUniqueResult { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::NotFound { table, id } => Self::NotFound { table, id },
            other => Self::Query(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::db::DbError;
    use crate::query::QueryError;

    #[test]
    fn query_not_found_becomes_repo_not_found() {
        let err = RepoError::from(QueryError::NotFound {
            table: "members",
            id: 3,
        });
        assert!(matches!(
            err,
            RepoError::NotFound {
                table: "members",
                id: 3
            }
        ));
        assert_eq!(err.to_string(), "members record not found: 3");
    }

    #[test]
    fn store_unavailable_is_detectable() {
        let err = RepoError::from(QueryError::from(DbError::PoolTimeout {
            waited_ms: 10,
            pool_size: 1,
        }));
        assert!(err.is_store_unavailable());
    }
}
