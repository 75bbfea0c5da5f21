//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for the stats endpoint (GET /stats)
///
/// Per-instance snapshots plus totals over every instance.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub instances: BTreeMap<String, StatsSnapshot>,
    pub total_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Hit rate over all instances (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Builds the response from `(instance name, snapshot)` pairs.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = (String, StatsSnapshot)>) -> Self {
        let instances: BTreeMap<String, StatsSnapshot> = snapshots.into_iter().collect();

        let total_entries = instances.values().map(|s| s.size).sum();
        let hits: u64 = instances.values().map(|s| s.hits).sum();
        let misses: u64 = instances.values().map(|s| s.misses).sum();
        let evictions = instances.values().map(|s| s.evictions).sum();

        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 {
            hits as f64 / total_requests as f64
        } else {
            0.0
        };

        Self {
            instances,
            total_entries,
            hits,
            misses,
            evictions,
            hit_rate,
        }
    }
}

/// Response body for pattern invalidation (POST /invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub pattern: String,
    /// Entries removed across the targeted instances
    pub removed: usize,
    pub instances: Vec<String>,
}

/// Response body for a changed record (POST /records/changed)
#[derive(Debug, Clone, Serialize)]
pub struct RecordChangedResponse {
    pub subject_id: String,
    /// Entries removed by subject pattern; range clears are not counted
    pub removed: usize,
}

/// Response body for clearing instances (DELETE /cache, DELETE /cache/:instance)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub instances: Vec<String>,
}

impl ClearResponse {
    pub fn new(instances: Vec<String>) -> Self {
        Self {
            message: format!("Cleared {} cache instance(s)", instances.len()),
            instances,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
