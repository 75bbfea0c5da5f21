//! Tracked Cache Module
//!
//! Thread-safe handle around a [`CacheStore`] that counts hits, misses and
//! evictions on the way through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheStats, CacheStore, StatsSnapshot};
use crate::config::InstanceConfig;
use crate::error::Result;

// == Tracked Cache ==
/// A named, shareable cache instance with statistics.
///
/// Cloning is cheap and every clone sees the same store and counters. All
/// mutating operations take the store's write lock, including `get`, which
/// has to bump recency.
#[derive(Debug)]
pub struct TrackedCache<V> {
    name: Arc<str>,
    store: Arc<RwLock<CacheStore<V>>>,
    stats: Arc<CacheStats>,
}

impl<V> Clone for TrackedCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            store: Arc::clone(&self.store),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<V: Clone + Send + Sync> TrackedCache<V> {
    // == Constructor ==
    /// Builds an instance from its configuration, failing on zero TTL or capacity.
    pub fn new(name: &str, config: &InstanceConfig) -> Result<Self> {
        let store = CacheStore::try_new(config.max_entries, config.default_ttl())?;
        Ok(Self::from_store(name, store))
    }

    /// Wraps an existing store.
    pub fn from_store(name: &str, store: CacheStore<V>) -> Self {
        Self {
            name: Arc::from(name),
            store: Arc::new(RwLock::new(store)),
            stats: Arc::new(CacheStats::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Set ==
    /// Upserts `key`. Counts an eviction if a new key pushed out the LRU entry.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let evicted = {
            let mut store = self.store.write().await;
            store.set(key.into(), value, ttl)
        };

        if let Some(evicted_key) = evicted {
            self.stats.record_eviction();
            debug!(instance = %self.name, key = %evicted_key, "Evicted least recently used entry");
        }
    }

    // == Get ==
    /// Returns the live value for `key`, counting a hit or a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let value = {
            let mut store = self.store.write().await;
            store.get(key)
        };

        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Has ==
    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    // == Delete ==
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    // == Clear ==
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    // == Cleanup Expired ==
    /// Purges expired entries and returns how many were removed.
    ///
    /// Expired keys are collected under the read lock, then removed one at a
    /// time so foreground traffic only ever waits on a single removal. A key
    /// refreshed in between is re-checked and kept.
    pub async fn cleanup_expired(&self) -> usize {
        let expired_keys = self.store.read().await.expired_keys();

        let mut removed = 0;
        for key in expired_keys {
            if self.store.write().await.remove_if_expired(&key) {
                removed += 1;
            }
        }
        removed
    }

    /// Every resident key, expired or not.
    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the counters plus a live scan of the store.
    pub async fn stats(&self) -> StatsSnapshot {
        let store = self.store.read().await;
        let size = store.len();
        let active_count = store.active_count();

        StatsSnapshot {
            size,
            active_count,
            expired_count: size - active_count,
            capacity: store.capacity(),
            hit_rate: self.stats.hit_rate(),
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            evictions: self.stats.evictions(),
        }
    }
}

impl TrackedCache<serde_json::Value> {
    /// Typed read over a JSON-valued instance.
    ///
    /// A stored value that no longer matches `T` is dropped and counted as a
    /// miss, so the caller falls back to its source of truth. Decoding happens
    /// under the write lock, so only the undecodable value itself is removed.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let decoded = {
            let mut store = self.store.write().await;
            let value = store.get(key);
            value.and_then(|value| match serde_json::from_value(value) {
                Ok(typed) => Some(typed),
                Err(err) => {
                    debug!(instance = %self.name, key, error = %err, "Dropping undecodable cached value");
                    store.delete(key);
                    None
                }
            })
        };

        match decoded {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        decoded
    }

    /// Typed write over a JSON-valued instance. Values that fail to serialize are not cached.
    pub async fn set_json<T: Serialize>(&self, key: impl Into<String>, value: &T, ttl: Option<Duration>) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json, ttl).await,
            Err(err) => {
                debug!(instance = %self.name, key = %key, error = %err, "Skipping unserializable value");
            }
        }
    }
}

// == Cache Instance ==
/// Value-type-erased view of a cache, used by code that works across several
/// named instances (invalidation, background cleanup, diagnostics).
#[async_trait]
pub trait CacheInstance: Send + Sync {
    fn name(&self) -> &str;
    async fn keys(&self) -> Vec<String>;
    async fn delete(&self, key: &str) -> bool;
    async fn clear(&self);
    async fn cleanup_expired(&self) -> usize;
    async fn stats(&self) -> StatsSnapshot;
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> CacheInstance for TrackedCache<V> {
    fn name(&self) -> &str {
        TrackedCache::name(self)
    }

    async fn keys(&self) -> Vec<String> {
        TrackedCache::keys(self).await
    }

    async fn delete(&self, key: &str) -> bool {
        TrackedCache::delete(self, key).await
    }

    async fn clear(&self) {
        TrackedCache::clear(self).await
    }

    async fn cleanup_expired(&self) -> usize {
        TrackedCache::cleanup_expired(self).await
    }

    async fn stats(&self) -> StatsSnapshot {
        TrackedCache::stats(self).await
    }
}
