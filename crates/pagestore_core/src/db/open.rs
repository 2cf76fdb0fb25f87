//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the record store.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

pub(crate) const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = Connection::open_in_memory();
    finish_open(conn, "memory", DEFAULT_BUSY_TIMEOUT, started_at)
}

pub(crate) fn open_db_with_busy_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let conn = Connection::open(path);
    finish_open(conn, "file", busy_timeout, started_at)
}

fn finish_open(
    opened: rusqlite::Result<Connection>,
    mode: &'static str,
    busy_timeout: Duration,
    started_at: Instant,
) -> DbResult<Connection> {
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}
