/// Result cache — directory path to the records its last scan produced.
///
/// This type is plain data with no locking of its own; [`SharedState`] owns
/// it behind the engine-wide mutex. Every method takes the current clock
/// reading explicitly so expiry is decided against one consistent `now`.
///
/// # Keys
///
/// Keys are the raw `OsString` of the requested path, compared byte for
/// byte. `roms/` and `roms`, or a relative path and its absolute form, are
/// different entries. `PathBuf` is deliberately not used as the key type
/// because its `Eq` compares components and would fold trailing slashes.
///
/// # Eviction
///
/// When an insertion takes the map past capacity, the entry with the oldest
/// creation timestamp is dropped. Lookups do not refresh timestamps, so this
/// is insertion-age order, not LRU. The oldest entry is found with a linear
/// scan, which is fine at the handful-of-directories sizes this cache holds.
///
/// [`SharedState`]: super::SharedState
use super::ScanResults;
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::time::Duration;
use tracing::debug;

/// One cached scan. Never mutated after insertion.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    results: ScanResults,
    created_at: Duration,
}

impl CacheEntry {
    pub fn results(&self) -> &ScanResults {
        &self.results
    }

    /// Clock reading at insertion.
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    fn is_fresh(&self, now: Duration, ttl: Duration) -> bool {
        now.saturating_sub(self.created_at) < ttl
    }
}

/// Snapshot of cache counters, as reported to frontends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, in `0.0..=1.0`; `0.0` before any lookup.
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<OsString, CacheEntry>,
    ttl: Duration,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    /// `capacity` is clamped to at least one entry.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity + 1),
            ttl,
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached results for `key` if present and not expired.
    ///
    /// Counts a hit or a miss. Expired entries count as a miss and stay in
    /// the map until they are evicted or overwritten.
    pub fn lookup(&mut self, key: &OsStr, now: Duration) -> Option<ScanResults> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                self.hits += 1;
                Some(entry.results.clone())
            }
            Some(entry) => {
                self.misses += 1;
                debug!(
                    "Cache entry for {} expired ({:?} old)",
                    key.to_string_lossy(),
                    now.saturating_sub(entry.created_at)
                );
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or replace the entry for `key`, evicting the oldest entry if
    /// the cache is now over capacity. Returns the evicted key, if any.
    pub fn store(&mut self, key: OsString, results: ScanResults, now: Duration) -> Option<OsString> {
        self.entries.insert(
            key.clone(),
            CacheEntry {
                results,
                created_at: now,
            },
        );
        if self.entries.len() <= self.capacity {
            return None;
        }

        // The entry just written is never the eviction victim, even when the
        // clock has not moved since an older insertion.
        let victim = self
            .entries
            .iter()
            .filter(|(k, _)| **k != key)
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&victim);
        debug!("Evicted oldest cache entry {}", victim.to_string_lossy());
        Some(victim)
    }

    /// Drop every entry and zero both counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn get(&self, key: &OsStr) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn statistics(&self) -> CacheStatistics {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        };
        CacheStatistics {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            size: self.entries.len(),
            max_size: self.capacity,
        }
    }
}
