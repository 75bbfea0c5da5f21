//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, LruTracker};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Bounded key-value storage with lazy TTL expiry and LRU eviction.
///
/// The store is single-threaded (`&mut self`); shared access goes through
/// [`TrackedCache`](crate::cache::TrackedCache), which owns the lock.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker, always holding exactly the keys of `entries`
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A zero capacity or zero TTL is a configuration error.
    pub fn try_new(max_entries: usize, default_ttl: Duration) -> Result<Self> {
        if max_entries == 0 {
            return Err(CacheError::Configuration(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if default_ttl.is_zero() {
            return Err(CacheError::Configuration(
                "default TTL must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
            default_ttl,
        })
    }

    // == Set ==
    /// Stores a key-value pair, replacing any existing entry.
    ///
    /// If the key is new and the store is at capacity, the least recently
    /// used entry is evicted first and its key is returned. A missing or zero
    /// `ttl` falls back to the default TTL.
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>) -> Option<String> {
        let is_overwrite = self.entries.contains_key(&key);

        let mut evicted = None;
        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                evicted = Some(evicted_key);
            }
        }

        let effective_ttl = ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);

        self.entries
            .insert(key.clone(), CacheEntry::new(value, effective_ttl));
        self.lru.touch(&key);

        evicted
    }

    // == Has ==
    /// Returns whether a live entry exists for `key`.
    ///
    /// An expired entry is purged on detection. Recency is left untouched.
    pub fn has(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.purge(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys = self.expired_keys();
        let count = expired_keys.len();

        for key in expired_keys {
            self.purge(&key);
        }

        count
    }

    /// Keys whose entries are logically expired but still resident.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Purges `key` only if its entry is expired right now.
    pub fn remove_if_expired(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.purge(key);
                true
            }
            _ => false,
        }
    }

    /// Every resident key, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of resident entries that have not expired yet.
    pub fn active_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    // == Length ==
    /// Returns the current number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn purge(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.remove(key);
    }
}

impl<V: Clone> CacheStore<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired, bumping its recency.
    /// Expired entries are purged and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;

        if entry.is_expired() {
            self.purge(key);
            return None;
        }

        let value = entry.value.clone();
        self.lru.touch(key);
        Some(value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(300);

    fn store(max_entries: usize) -> CacheStore<String> {
        CacheStore::try_new(max_entries, TTL).unwrap()
    }

    fn set(store: &mut CacheStore<String>, key: &str, value: &str) -> Option<String> {
        store.set(key.to_string(), value.to_string(), None)
    }

    #[test]
    fn test_store_new() {
        let store = store(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
        assert_eq!(store.default_ttl(), TTL);
    }

    #[test]
    fn test_store_rejects_zero_capacity() {
        let result = CacheStore::<String>::try_new(0, TTL);
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[test]
    fn test_store_rejects_zero_ttl() {
        let result = CacheStore::<String>::try_new(10, Duration::ZERO);
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = store(100);

        set(&mut store, "key1", "value1");

        assert_eq!(store.get("key1").as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_delete() {
        let mut store = store(100);

        set(&mut store, "key1", "value1");

        assert!(store.delete("key1"));
        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_delete_nonexistent() {
        let mut store = store(100);
        assert!(!store.delete("nonexistent"));
    }

    #[test]
    fn test_store_clear_is_idempotent() {
        let mut store = store(100);
        set(&mut store, "a", "1");
        set(&mut store, "b", "2");

        store.clear();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100);

        set(&mut store, "key1", "value1");
        set(&mut store, "key1", "value2");

        assert_eq!(store.get("key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let mut store = store(2);

        set(&mut store, "a", "1");
        set(&mut store, "b", "2");

        assert_eq!(set(&mut store, "a", "3"), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = store(100);

        store.set(
            "key1".to_string(),
            "value1".to_string(),
            Some(Duration::from_millis(30)),
        );
        assert!(store.get("key1").is_some());

        sleep(Duration::from_millis(60));

        assert_eq!(store.get("key1"), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_zero_ttl_uses_default() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(Duration::ZERO));
        sleep(Duration::from_millis(5));

        assert!(store.has("key1"));
    }

    #[test]
    fn test_store_has_purges_expired() {
        let mut store = store(100);

        store.set("key1".to_string(), "v".to_string(), Some(Duration::from_millis(20)));
        assert!(store.has("key1"));

        sleep(Duration::from_millis(50));

        assert!(!store.has("key1"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_store_has_does_not_refresh_recency() {
        let mut store = store(2);

        set(&mut store, "a", "1");
        set(&mut store, "b", "2");
        assert!(store.has("a"));

        // `a` is still the least recently used key
        assert_eq!(set(&mut store, "c", "3"), Some("a".to_string()));
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = store(3);

        set(&mut store, "key1", "value1");
        set(&mut store, "key2", "value2");
        set(&mut store, "key3", "value3");

        let evicted = set(&mut store, "key4", "value4");

        assert_eq!(evicted, Some("key1".to_string()));
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = store(2);

        set(&mut store, "a", "1");
        set(&mut store, "b", "2");
        store.get("a");
        set(&mut store, "c", "3");

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = store(100);

        store.set("key1".to_string(), "value1".to_string(), Some(Duration::from_millis(20)));
        store.set("key2".to_string(), "value2".to_string(), Some(Duration::from_secs(10)));

        sleep(Duration::from_millis(50));

        assert_eq!(store.active_count(), 1);
        assert_eq!(store.expired_keys(), vec!["key1".to_string()]);

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[test]
    fn test_store_remove_if_expired_keeps_live_entries() {
        let mut store = store(100);
        set(&mut store, "live", "v");

        assert!(!store.remove_if_expired("live"));
        assert!(!store.remove_if_expired("missing"));
        assert_eq!(store.len(), 1);
    }
}
