//! In-memory cache for series listings fetched from the media server.
//!
//! The cache is shared through `AppContext::cache`. Code that lists series
//! reads and fills it with [`Cache::get`] and [`Cache::set`] under
//! [`ALL_SERIES_KEY`] and [`series_key`]; the reconciler only invalidates it.
//! Saving the configuration expires [`ALL_SERIES_KEY`] and, on most paths,
//! every per-series entry under [`SERIES_DATA_PREFIX`].

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cached list of all series.
pub const ALL_SERIES_KEY: &str = "oc_allseries";

/// Prefix of cached per-series data.
pub const SERIES_DATA_PREFIX: &str = "oc_series/";

struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

/// Thread-safe named cache with a fixed time-to-live.
#[derive(Clone)]
pub struct Cache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Cache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Get a live entry; an expired entry is dropped and reported as missing.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
        }
        // a concurrent set may have refreshed the entry since the read above
        self.entries
            .remove_if(key, |_, e| e.inserted_at.elapsed() >= self.ttl);
        None
    }

    pub fn set(&self, key: &str, value: Value) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop one entry. Returns whether it was present.
    pub fn expire(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        tracing::debug!("Expired cache key {} (present: {})", key, removed);
        removed
    }

    /// Drop all cached per-series data. Returns the number of entries removed.
    pub fn clear_cached_series_data(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !key.starts_with(SERIES_DATA_PREFIX));
        let removed = before.saturating_sub(self.entries.len());
        tracing::debug!("Cleared {} cached series entries", removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

/// Cache key for one series' data.
pub fn series_key(series_id: &str) -> String {
    format!("{}{}", SERIES_DATA_PREFIX, series_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get() {
        let cache = Cache::default();
        cache.set(ALL_SERIES_KEY, json!(["a", "b"]));
        assert_eq!(cache.get(ALL_SERIES_KEY), Some(json!(["a", "b"])));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = Cache::new(Duration::ZERO);
        cache.set(ALL_SERIES_KEY, json!(1));
        assert_eq!(cache.get(ALL_SERIES_KEY), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_keeps_fresh_entry() {
        let cache = Cache::default();
        cache.set(&series_key("s1"), json!({"title": "One"}));
        assert!(cache.get(&series_key("s1")).is_some());
        assert!(cache.get(&series_key("s1")).is_some());
        assert_eq!(cache.len(), 1);

        // a miss on another key leaves live entries alone
        assert_eq!(cache.get(&series_key("s2")), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expire() {
        let cache = Cache::default();
        cache.set(ALL_SERIES_KEY, json!(1));
        assert!(cache.expire(ALL_SERIES_KEY));
        assert!(!cache.expire(ALL_SERIES_KEY));
    }

    #[test]
    fn test_clear_series_data_keeps_other_keys() {
        let cache = Cache::default();
        cache.set(&series_key("s1"), json!({"title": "One"}));
        cache.set(&series_key("s2"), json!({"title": "Two"}));
        cache.set(ALL_SERIES_KEY, json!([]));

        assert_eq!(cache.clear_cached_series_data(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(ALL_SERIES_KEY).is_some());
    }
}
