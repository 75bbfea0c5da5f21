//! Configuration Module
//!
//! Handles loading and validating cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Instance Config ==
/// Construction parameters for one named cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstanceConfig {
    /// TTL applied when `set` is called without one, in milliseconds
    pub default_ttl_ms: u64,
    /// Maximum number of resident entries
    pub max_entries: usize,
}

impl InstanceConfig {
    pub const fn new(default_ttl_ms: u64, max_entries: usize) -> Self {
        Self {
            default_ttl_ms,
            max_entries,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.default_ttl_ms == 0 {
            return Err(CacheError::Configuration(format!(
                "{name}: default TTL must be greater than zero"
            )));
        }
        if self.max_entries == 0 {
            return Err(CacheError::Configuration(format!(
                "{name}: max entries must be greater than zero"
            )));
        }
        Ok(())
    }
}

/// Short-lived cache of raw API responses.
pub const RESPONSE_CACHE_PRESET: InstanceConfig = InstanceConfig::new(2 * 60 * 1000, 200);
/// Per-user data such as balances and profiles.
pub const USER_CACHE_PRESET: InstanceConfig = InstanceConfig::new(5 * 60 * 1000, 100);
/// High-churn list and calendar range lookups.
pub const RANGE_CACHE_PRESET: InstanceConfig = InstanceConfig::new(60 * 1000, 150);
/// Slow-changing aggregate statistics.
pub const STATS_CACHE_PRESET: InstanceConfig = InstanceConfig::new(10 * 60 * 1000, 50);

/// Server and cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    pub responses: InstanceConfig,
    pub users: InstanceConfig,
    pub ranges: InstanceConfig,
    pub stats: InstanceConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 300)
    /// - `RESPONSE_CACHE_TTL_MS` / `RESPONSE_CACHE_MAX_ENTRIES` (default: 120000 / 200)
    /// - `USER_CACHE_TTL_MS` / `USER_CACHE_MAX_ENTRIES` (default: 300000 / 100)
    /// - `RANGE_CACHE_TTL_MS` / `RANGE_CACHE_MAX_ENTRIES` (default: 60000 / 150)
    /// - `STATS_CACHE_TTL_MS` / `STATS_CACHE_MAX_ENTRIES` (default: 600000 / 50)
    ///
    /// Unparseable values fall back to the default; use [`Config::validate`]
    /// to reject zeros.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            responses: instance_from_env("RESPONSE_CACHE", defaults.responses),
            users: instance_from_env("USER_CACHE", defaults.users),
            ranges: instance_from_env("RANGE_CACHE", defaults.ranges),
            stats: instance_from_env("STATS_CACHE", defaults.stats),
        }
    }

    /// Rejects zero TTLs, capacities and cleanup intervals.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval == 0 {
            return Err(CacheError::Configuration(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }
        self.responses.validate("responses")?;
        self.users.validate("users")?;
        self.ranges.validate("ranges")?;
        self.stats.validate("stats")
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 300,
            responses: RESPONSE_CACHE_PRESET,
            users: USER_CACHE_PRESET,
            ranges: RANGE_CACHE_PRESET,
            stats: STATS_CACHE_PRESET,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn instance_from_env(prefix: &str, default: InstanceConfig) -> InstanceConfig {
    InstanceConfig {
        default_ttl_ms: env_or(&format!("{prefix}_TTL_MS"), default.default_ttl_ms),
        max_entries: env_or(&format!("{prefix}_MAX_ENTRIES"), default.max_entries),
    }
}
