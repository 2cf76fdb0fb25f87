use crate::db::DbError;
use crate::model::record::RecordId;
use crate::schema::FieldKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type QueryResult<T> = Result<T, QueryError>;

/// Error for query building, execution and row decoding.
///
/// Caller errors (`InvalidPageRequest`, `UnknownField`, `TypeMismatch`,
/// `InvalidMutation`) are raised before any SQL runs and should not be retried.
#[derive(Debug)]
pub enum QueryError {
    /// Negative offset, non-positive limit, or a window that overflows.
    InvalidPageRequest(String),
    /// Filter, sort or mutation names a field the table does not have.
    UnknownField {
        table: &'static str,
        field: String,
    },
    /// Value cannot be compared with or stored in the field.
    TypeMismatch {
        field: String,
        expected: FieldKind,
    },
    InvalidMutation(String),
    NotFound {
        table: &'static str,
        id: RecordId,
    },
    /// Required table is missing from the connected database.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Store could not be reached (pool timeout, busy/locked or unopenable
    /// database). Not retried here.
    StoreUnavailable(DbError),
    Db(DbError),
    /// Persisted data cannot be decoded into the expected shape.
    InvalidData(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageRequest(message) => write!(f, "invalid page request: {message}"),
            Self::UnknownField { table, field } => {
                write!(f, "unknown field `{field}` for table `{table}`")
            }
            Self::TypeMismatch { field, expected } => {
                write!(f, "value for field `{field}` must be {expected}")
            }
            Self::InvalidMutation(message) => write!(f, "invalid mutation: {message}"),
            Self::NotFound { table, id } => write!(f, "record {id} not found in `{table}`"),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record store requires column `{column}` in table `{table}`"
            ),
            Self::StoreUnavailable(err) => write!(f, "record store unavailable: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) | Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for QueryError {
    fn from(value: DbError) -> Self {
        if value.is_unavailable() {
            Self::StoreUnavailable(value)
        } else {
            Self::Db(value)
        }
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}
