//! Store configuration.
//!
//! # Responsibility
//! - Describe where the record store lives and how it is pooled.
//! - Carry paging defaults applied to external page requests.
//!
//! # Invariants
//! - Every field has a default, so partial JSON documents are valid.
//! - `default_page_size` never exceeds `max_page_size` after `normalized()`.

use crate::db::PoolOptions;
use crate::executor::DEFAULT_CACHE_CAPACITY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_POOL_SIZE: usize = 4;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 2_000;

/// Configuration error for loading `StoreConfig` documents.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid store config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file path. `None` selects a private in-memory database.
    pub database_path: Option<PathBuf>,
    /// Maximum pooled connections (in-memory stores always use one).
    pub pool_size: usize,
    /// Milliseconds to wait for a pooled connection before failing.
    pub acquire_timeout_ms: u64,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Page size used when a page request omits one.
    pub default_page_size: u32,
    /// Upper bound applied to requested page sizes.
    pub max_page_size: u32,
    /// Records an executor caches before it starts evicting.
    pub cache_capacity: usize,
    /// Optional log level (`trace|debug|info|warn|error`).
    pub log_level: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            log_level: None,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON document. Missing keys fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        Ok(parsed.normalized())
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Clamps paging, pool and cache knobs into a consistent range.
    pub fn normalized(mut self) -> Self {
        self.max_page_size = self.max_page_size.max(1);
        self.default_page_size = self.default_page_size.clamp(1, self.max_page_size);
        self.pool_size = self.pool_size.max(1);
        self.cache_capacity = self.cache_capacity.max(1);
        self
    }

    /// Pool options derived from this configuration.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_size: self.pool_size,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig};
    use std::time::Duration;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StoreConfig::from_json_str(r#"{"pool_size": 2}"#).unwrap();
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 2_000);
        assert!(config.database_path.is_none());
        assert_eq!(config.cache_capacity, 10_000);
    }

    #[test]
    fn zero_cache_capacity_is_raised_to_one() {
        let config = StoreConfig::from_json_str(r#"{"cache_capacity": 0}"#).unwrap();
        assert_eq!(config.cache_capacity, 1);
    }

    #[test]
    fn default_page_size_is_clamped_to_max() {
        let config =
            StoreConfig::from_json_str(r#"{"default_page_size": 50, "max_page_size": 10}"#)
                .unwrap();
        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = StoreConfig::from_json_str("{pool_size:").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn pool_options_convert_milliseconds() {
        let config = StoreConfig {
            acquire_timeout_ms: 250,
            ..StoreConfig::default()
        };
        assert_eq!(
            config.pool_options().acquire_timeout,
            Duration::from_millis(250)
        );
    }
}
