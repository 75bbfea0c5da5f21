//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction, statistics,
//! cache-aside loading and cross-instance invalidation.

mod entry;
mod invalidation;
mod loader;
mod lru;
pub mod registry;
mod stats;
mod store;
mod tracked;


// Re-export public types
pub use entry::CacheEntry;
pub use invalidation::{DateRange, InvalidationCoordinator};
pub use loader::{CacheAside, SharedLoadError, WarmingConfig, WarmingReport};
pub use lru::LruTracker;
pub use registry::{CacheRegistry, NamedCache};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
pub use tracked::{CacheInstance, TrackedCache};
