//! SQLite storage bootstrap, schema migrations and connection pooling.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the record store.
//! - Apply schema migrations in deterministic order.
//! - Lend connections to callers through a bounded pool.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No record data is read or written before migrations succeed.
//! - A pooled connection is returned to the pool on every exit path.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod pool;

pub use open::{open_db, open_db_in_memory};
pub use pool::{ConnectionPool, PoolOptions, PooledConnection};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Every pooled connection stayed borrowed for the whole acquire timeout.
    PoolTimeout {
        waited_ms: u128,
        pool_size: usize,
    },
}

impl DbError {
    /// Returns whether this error means the store cannot be reached right now,
    /// as opposed to a malformed request or corrupt data.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Sqlite(err) => is_unavailable_sqlite_error(err),
            Self::UnsupportedSchemaVersion { .. } => false,
            Self::PoolTimeout { .. } => true,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::PoolTimeout {
                waited_ms,
                pool_size,
            } => write!(
                f,
                "no pooled connection became available within {waited_ms}ms (pool size {pool_size})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::PoolTimeout { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

pub(crate) fn is_unavailable_sqlite_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => matches!(
            failure.code,
            rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::DatabaseBusy
                | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}
