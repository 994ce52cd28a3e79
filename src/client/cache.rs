use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::models::SearchPage;
use super::params::RequestSignature;

/// Default lifetime of a cached search page
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(120_000);

/// Cached search page with its insertion time
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub payload: SearchPage,
    pub inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(payload: SearchPage) -> Self {
        Self {
            payload,
            inserted_at: Instant::now(),
        }
    }

    /// Check if the entry is younger than `ttl` at `now`
    pub fn is_valid_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Search responses keyed by request signature
///
/// Expired entries are skipped on lookup rather than purged. The working set is
/// bounded by the distinct query/page combinations one session visits, so there is
/// no size-based eviction; a fresh put simply overwrites the previous entry.
pub struct ResponseCache {
    entries: Mutex<HashMap<RequestSignature, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Get the cached page if present and still valid
    pub fn get(&self, key: &RequestSignature) -> Option<SearchPage> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &RequestSignature, now: Instant) -> Option<SearchPage> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_valid_at(now, self.ttl) => {
                tracing::debug!("Cache hit for {}", key);
                Some(entry.payload.clone())
            }
            Some(_) => {
                tracing::debug!("Cache expired for {}", key);
                None
            }
            None => {
                tracing::debug!("Cache miss for {}", key);
                None
            }
        }
    }

    /// Store a page, replacing any previous entry for the same signature
    pub fn put(&self, key: RequestSignature, payload: SearchPage) {
        self.insert_entry(key, CacheEntry::new(payload));
    }

    fn insert_entry(&self, key: RequestSignature, entry: CacheEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!("Stored in cache: {}", key);
        entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("Response cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }

    fn stats_at(&self, now: Instant) -> CacheStats {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let total_entries = entries.len();
        let valid_entries = entries
            .values()
            .filter(|entry| entry.is_valid_at(now, self.ttl))
            .count();

        CacheStats {
            total_entries,
            valid_entries,
            expired_entries: total_entries - valid_entries,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
