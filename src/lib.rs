//! App Cache - an embedded caching layer for request-serving applications
//!
//! Named TTL + LRU cache instances with hit/miss statistics, cache-aside
//! loading, pattern invalidation and HTTP cache-header policies.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod headers;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheRegistry;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{spawn_cleanup_task, spawn_warming_tasks};
