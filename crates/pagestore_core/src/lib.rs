//! Paginated, filterable, sortable record retrieval over SQLite.
//!
//! Callers describe what they want with `FilterSpec`, `SortSpec` and
//! `PageWindow`; `QueryExecutor` turns that into bounded SQL against a
//! `RecordStore` and returns a `PageResult`. Member/team repositories and the
//! member service sit on top as the domain-facing API.

pub mod config;
pub mod db;
pub mod executor;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod schema;
pub mod service;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use db::{ConnectionPool, DbError, PoolOptions};
pub use executor::{Freshness, Loaded, QueryExecutor, DEFAULT_CACHE_CAPACITY};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::member::{Member, MemberDto, MemberId, MemberWithTeam, NewMember};
pub use model::record::{Record, RecordId};
pub use model::team::{Team, TeamId};
pub use model::value::FieldValue;
pub use model::ValidationError;
pub use query::{
    CountMode, Direction, FilterSpec, Mutation, PagePayload, PageResult, PageWindow, QueryError,
    QueryResult, SortSpec,
};
pub use repo::{
    ExecutorMemberRepository, ExecutorTeamRepository, MemberRepository, RepoError, RepoResult,
    TeamRepository,
};
pub use schema::{TableSchema, MEMBERS, TEAMS};
pub use service::{MemberService, MemberServiceError, PageParams, PagingDefaults};
pub use store::{RecordStore, SqliteRecordStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
