//! Query execution over a record store.
//!
//! # Responsibility
//! - Turn filter/sort/window specs into bounded page results.
//! - Run set-based updates and keep the per-executor record cache honest
//!   about what they may have changed.
//!
//! # Invariants
//! - Specs are validated against the schema before any store call.
//! - Records returned by a fetch replace their cache entries as fresh.
//! - After `bulk_update`, every cached record of the table reads as stale
//!   until it is refreshed or fetched again.
//! - The cache is bounded; see `QueryExecutor::with_cache_capacity`.

mod cache;
mod query_executor;

pub use cache::{Freshness, Loaded, DEFAULT_CACHE_CAPACITY};
pub use query_executor::QueryExecutor;
