//! Process-wide request cache.

use moka::sync::Cache;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// A resolved artifact and the name to suggest when it is downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub share_name: String,
}

/// Maps cache keys to resolved artifacts.
///
/// Entries expire a fixed time after they were written, however often they
/// are read. Entries are inserted whole, so a concurrent reader sees either
/// nothing or a complete entry. Cloning shares the underlying cache.
#[derive(Clone)]
pub struct RequestCache {
    entries: Cache<String, CacheEntry>,
}

impl RequestCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self { entries: Cache::builder().max_capacity(capacity).time_to_live(ttl).build() }
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key)
    }

    /// Insert (or overwrite) the entry for a key.
    pub fn set(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Approximate number of live entries.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}
