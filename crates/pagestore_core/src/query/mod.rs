//! Declarative query building blocks.
//!
//! # Responsibility
//! - Express record selection (`FilterSpec`), ordering (`SortSpec`), paging
//!   (`PageWindow`) and set-based writes (`Mutation`) without SQL.
//! - Compile those specs into bound SQL for the SQLite store.
//!
//! # Invariants
//! - Field references are resolved against a `TableSchema` before any SQL is
//!   produced; unknown fields never reach the database.
//! - Every ordering ends with a primary-key tie-break.

mod error;
pub mod filter;
pub mod mutation;
pub mod page;
pub mod sort;
pub(crate) mod sql;

pub use error::{QueryError, QueryResult};
pub use filter::{Comparator, FilterSpec, Predicate};
pub use mutation::{Assignment, Mutation};
pub use page::{CountMode, PageBody, PagePayload, PageResult, PageWindow, RowBounds, SliceBody};
pub use sort::{Direction, SortKey, SortSpec};
