use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// String-keyed cache whose entries expire a fixed time after insertion.
///
/// Expired entries are not evicted; they are ignored on read and replaced by
/// the next insert under the same key.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl_secs: i64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Value under `key` if it was cached less than the TTL before `now`.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = (now - entry.cached_at).num_seconds();
        if age < self.ttl_secs {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key, value, Utc::now());
    }

    pub fn insert_at(&self, key: impl Into<String>, value: V, cached_at: DateTime<Utc>) {
        self.entries.insert(key.into(), CacheEntry { data: value, cached_at });
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
