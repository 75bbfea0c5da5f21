//! Cache-Aside Loader Module
//!
//! Get-or-load helpers, bulk operations and declarative warming on top of a
//! [`TrackedCache`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use tracing::{debug, warn};

use crate::cache::TrackedCache;
use crate::error::CacheError;

/// Error handed to every waiter of a coalesced load.
pub type SharedLoadError = Arc<anyhow::Error>;

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V, SharedLoadError>>>;
type WarmLoader<V> = Arc<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<V>> + Send + Sync>;

// == Warming Config ==
/// A registered warming job: keys to keep populated and how to load them.
pub struct WarmingConfig<V> {
    pub keys: Vec<String>,
    pub interval: Duration,
    loader: WarmLoader<V>,
}

impl<V> Clone for WarmingConfig<V> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            interval: self.interval,
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<V> fmt::Debug for WarmingConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarmingConfig")
            .field("keys", &self.keys)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Outcome of one warming pass.
#[derive(Debug, Default)]
pub struct WarmingReport {
    /// Keys loaded and stored
    pub loaded: usize,
    /// Keys already present and left alone
    pub skipped: usize,
    /// Per-key loader failures
    pub failures: Vec<CacheError>,
}

// == Cache Aside ==
/// Cache-aside front for a [`TrackedCache`].
pub struct CacheAside<V> {
    cache: TrackedCache<V>,
    in_flight: Arc<Mutex<HashMap<String, SharedLoad<V>>>>,
    warming: Arc<Mutex<Vec<WarmingConfig<V>>>>,
}

impl<V> Clone for CacheAside<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            in_flight: Arc::clone(&self.in_flight),
            warming: Arc::clone(&self.warming),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> CacheAside<V> {
    pub fn new(cache: TrackedCache<V>) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            warming: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The underlying tracked cache.
    pub fn cache(&self) -> &TrackedCache<V> {
        &self.cache
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `loader`, stores its result and returns it.
    ///
    /// The store lock is not held while the loader runs. Concurrent misses on
    /// the same key may each run their loader; the last one to finish wins.
    /// A loader error is returned unchanged and nothing is stored.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.cache.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// Like [`get_or_set`](Self::get_or_set), but concurrent misses on the
    /// same key share a single load.
    ///
    /// The first caller starts the load; later callers wait on it and receive
    /// a clone of the same result. The shared load stores its value and frees
    /// the in-flight slot itself, so it still completes if the caller that
    /// started it goes away while another caller is waiting.
    pub async fn get_or_set_coalesced<F, Fut>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<Duration>,
    ) -> Result<V, SharedLoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(key).await {
            return Ok(value);
        }

        let load = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(key) {
                Some(load) => load.clone(),
                None => {
                    let load = self.shared_load(key.to_string(), loader(), ttl);
                    in_flight.insert(key.to_string(), load.clone());
                    load
                }
            }
        };

        load.await
    }

    fn shared_load<Fut>(&self, key: String, load: Fut, ttl: Option<Duration>) -> SharedLoad<V>
    where
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let cache = self.cache.clone();
        let in_flight = Arc::clone(&self.in_flight);

        async move {
            let result = load.map_err(Arc::new).await;
            if let Ok(value) = &result {
                cache.set(key.clone(), value.clone(), ttl).await;
            }
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            result
        }
        .boxed()
        .shared()
    }

    // == Bulk ==
    /// Independent lookups for each key.
    pub async fn get_bulk<I, K>(&self, keys: I) -> HashMap<String, Option<V>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut found = HashMap::new();
        for key in keys {
            let key = key.into();
            let value = self.cache.get(&key).await;
            found.insert(key, value);
        }
        found
    }

    /// Independent upserts for each entry, all with the same TTL.
    pub async fn set_bulk<I, K>(&self, entries: I, ttl: Option<Duration>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        for (key, value) in entries {
            self.cache.set(key, value, ttl).await;
        }
    }

    // == Warming ==
    /// Registers a warming job for `keys`, loaded with `loader` every `interval`.
    ///
    /// A zero interval is a configuration error.
    pub fn add_warming_config<F, Fut>(
        &self,
        keys: Vec<String>,
        loader: F,
        interval: Duration,
    ) -> Result<(), CacheError>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CacheError::Configuration(format!(
                "{}: warming interval must be greater than zero",
                self.cache.name()
            )));
        }

        let loader: WarmLoader<V> = Arc::new(move |key| loader(key).boxed());
        self.warming
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(WarmingConfig {
                keys,
                interval,
                loader,
            });
        Ok(())
    }

    /// Snapshot of the registered warming jobs.
    pub fn warming_configs(&self) -> Vec<WarmingConfig<V>> {
        self.warming
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs every registered warming job once.
    pub async fn warm_cache(&self) -> WarmingReport {
        let mut report = WarmingReport::default();
        for config in self.warming_configs() {
            let pass = self.warm(&config).await;
            report.loaded += pass.loaded;
            report.skipped += pass.skipped;
            report.failures.extend(pass.failures);
        }
        report
    }

    /// Loads every key of `config` that is not currently present.
    ///
    /// Loader failures are logged and collected; they never stop the pass.
    pub async fn warm(&self, config: &WarmingConfig<V>) -> WarmingReport {
        let mut report = WarmingReport::default();

        for key in &config.keys {
            if self.cache.has(key).await {
                report.skipped += 1;
                continue;
            }

            match (config.loader)(key.clone()).await {
                Ok(value) => {
                    self.cache.set(key.clone(), value, None).await;
                    report.loaded += 1;
                }
                Err(err) => {
                    warn!(
                        instance = %self.cache.name(),
                        key = %key,
                        error = %err,
                        "Cache warming loader failed"
                    );
                    report.failures.push(CacheError::Loader {
                        key: key.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        debug!(
            instance = %self.cache.name(),
            loaded = report.loaded,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Cache warming pass finished"
        );
        report
    }
}
