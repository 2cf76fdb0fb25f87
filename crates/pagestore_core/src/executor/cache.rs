//! Per-executor record cache with freshness tracking.
//!
//! # Invariants
//! - Keys are `(table, id)`; tables never share entries.
//! - A stale entry keeps the values it was loaded with until it is refreshed.
//! - The cache never holds more than `capacity` entries. When a new key would
//!   exceed it, stale entries are dropped first, then everything else.

use crate::model::record::{Record, RecordId};
use log::debug;
use std::collections::HashMap;

/// Entries kept per executor unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Whether a cached copy still reflects the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// A set-based write may have changed the row since it was loaded.
    Stale,
}

/// Value read through the cache, tagged with its freshness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub value: T,
    pub freshness: Freshness,
}

impl<T> Loaded<T> {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            freshness: self.freshness,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Loaded<U>, E> {
        Ok(Loaded {
            value: f(self.value)?,
            freshness: self.freshness,
        })
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: Record,
    freshness: Freshness,
}

#[derive(Debug)]
pub(crate) struct RecordCache {
    entries: HashMap<(&'static str, RecordId), CacheEntry>,
    capacity: usize,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl RecordCache {
    /// A capacity of 0 is treated as 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, table: &'static str, id: RecordId) -> Option<Loaded<Record>> {
        self.entries.get(&(table, id)).map(|entry| Loaded {
            value: entry.record.clone(),
            freshness: entry.freshness,
        })
    }

    pub fn freshness(&self, table: &'static str, id: RecordId) -> Option<Freshness> {
        self.entries.get(&(table, id)).map(|entry| entry.freshness)
    }

    pub fn put_fresh(&mut self, table: &'static str, record: Record) {
        if !self.entries.contains_key(&(table, record.id)) {
            self.make_room();
        }
        self.entries.insert(
            (table, record.id),
            CacheEntry {
                record,
                freshness: Freshness::Fresh,
            },
        );
    }

    /// Marks every cached row of `table` stale; returns how many were marked.
    pub fn mark_table_stale(&mut self, table: &'static str) -> usize {
        let mut marked = 0;
        for ((entry_table, _), entry) in self.entries.iter_mut() {
            if *entry_table == table {
                entry.freshness = Freshness::Stale;
                marked += 1;
            }
        }
        marked
    }

    pub fn remove(&mut self, table: &'static str, id: RecordId) {
        self.entries.remove(&(table, id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn make_room(&mut self) {
        if self.entries.len() < self.capacity {
            return;
        }
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.freshness == Freshness::Fresh);
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        debug!(
            "event=cache_evict module=executor status=ok evicted={} capacity={}",
            before - self.entries.len(),
            self.capacity
        );
    }
}
