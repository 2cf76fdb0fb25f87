//! Bounded SQLite connection pool with RAII checkout guards.
//!
//! # Responsibility
//! - Lend one migrated connection per store call.
//! - Return the connection when the guard drops, including on error paths.
//!
//! # Invariants
//! - At most `max_size` connections are ever open.
//! - In-memory pools hold exactly one connection, since separate in-memory
//!   connections never see each other's data.
//! - `acquire` never blocks longer than the configured timeout.

use super::open::{open_db_in_memory, open_db_with_busy_timeout, DEFAULT_BUSY_TIMEOUT};
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const DEFAULT_POOL_SIZE: usize = 4;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sizing and timeout knobs for [`ConnectionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Upper bound of simultaneously open connections. Clamped to at least 1.
    pub max_size: usize,
    /// How long `acquire` waits for a borrowed connection to come back.
    pub acquire_timeout: Duration,
    /// SQLite busy timeout applied to every opened connection.
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
enum ConnectionSource {
    File(PathBuf),
    Memory,
}

struct PoolState {
    idle: Vec<Connection>,
    open: usize,
}

/// Pool of migrated SQLite connections.
pub struct ConnectionPool {
    source: ConnectionSource,
    options: PoolOptions,
    state: Mutex<PoolState>,
    released: Condvar,
}

impl ConnectionPool {
    /// Opens a file-backed pool. One connection is opened eagerly so that
    /// migration failures surface here instead of on the first query.
    pub fn open(path: impl AsRef<Path>, options: PoolOptions) -> DbResult<Self> {
        let source = ConnectionSource::File(path.as_ref().to_path_buf());
        let options = PoolOptions {
            max_size: options.max_size.max(1),
            ..options
        };
        Self::with_first_connection(source, options)
    }

    /// Opens a pool over a private in-memory database.
    pub fn in_memory(options: PoolOptions) -> DbResult<Self> {
        let options = PoolOptions {
            max_size: 1,
            ..options
        };
        Self::with_first_connection(ConnectionSource::Memory, options)
    }

    /// Builds a pool from store configuration; no database path means memory.
    pub fn from_config(config: &StoreConfig) -> DbResult<Self> {
        let options = config.pool_options();
        match config.database_path.as_ref() {
            Some(path) => Self::open(path, options),
            None => Self::in_memory(options),
        }
    }

    fn with_first_connection(source: ConnectionSource, options: PoolOptions) -> DbResult<Self> {
        let pool = Self {
            source,
            options,
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(options.max_size),
                open: 0,
            }),
            released: Condvar::new(),
        };

        let first = pool.open_connection()?;
        {
            let mut state = pool.state.lock();
            state.idle.push(first);
            state.open = 1;
        }
        Ok(pool)
    }

    /// Borrows one connection, waiting up to the acquire timeout.
    ///
    /// # Errors
    /// - `DbError::PoolTimeout` when every connection stays borrowed.
    /// - Open/migration errors when a new connection has to be created.
    pub fn acquire(&self) -> DbResult<PooledConnection<'_>> {
        let started_at = Instant::now();
        let deadline = started_at + self.options.acquire_timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection::new(self, conn));
            }

            if state.open < self.options.max_size {
                state.open += 1;
                drop(state);
                return match self.open_connection() {
                    Ok(conn) => {
                        debug!(
                            "event=pool_grow module=db status=ok pool_size={}",
                            self.options.max_size
                        );
                        Ok(PooledConnection::new(self, conn))
                    }
                    Err(err) => {
                        self.state.lock().open -= 1;
                        self.released.notify_one();
                        Err(err)
                    }
                };
            }

            if self.released.wait_until(&mut state, deadline).timed_out() {
                if let Some(conn) = state.idle.pop() {
                    return Ok(PooledConnection::new(self, conn));
                }
                let waited_ms = started_at.elapsed().as_millis();
                warn!(
                    "event=pool_acquire module=db status=error error_code=pool_timeout waited_ms={} pool_size={}",
                    waited_ms, self.options.max_size
                );
                return Err(DbError::PoolTimeout {
                    waited_ms,
                    pool_size: self.options.max_size,
                });
            }
        }
    }

    /// Maximum number of connections this pool will open.
    pub fn max_size(&self) -> usize {
        self.options.max_size
    }

    /// Number of opened connections currently sitting idle.
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    fn open_connection(&self) -> DbResult<Connection> {
        match &self.source {
            ConnectionSource::File(path) => {
                open_db_with_busy_timeout(path, self.options.busy_timeout)
            }
            ConnectionSource::Memory => open_db_in_memory(),
        }
    }

    fn release(&self, conn: Connection) {
        self.state.lock().idle.push(conn);
        self.released.notify_one();
    }
}

/// Borrowed connection. Goes back to its pool when dropped.
pub struct PooledConnection<'pool> {
    pool: &'pool ConnectionPool,
    conn: Option<Connection>,
}

impl<'pool> PooledConnection<'pool> {
    fn new(pool: &'pool ConnectionPool, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
        }
    }
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("pooled connection is present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn
            .as_mut()
            .expect("pooled connection is present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
