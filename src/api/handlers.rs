//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheInstance, CacheRegistry, InvalidationCoordinator};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::headers::HeaderPolicyEngine;
use crate::models::{
    ClearResponse, HealthResponse, InvalidateRequest, InvalidateResponse, RecordChangedRequest,
    RecordChangedResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Named cache instances
    pub registry: CacheRegistry,
    /// Invalidation wiring used by write notifications
    pub coordinator: Arc<InvalidationCoordinator>,
    /// Endpoint cache-header policies
    pub engine: Arc<HeaderPolicyEngine>,
}

impl AppState {
    /// Creates a new AppState over `registry` with the default header policies.
    pub fn new(registry: CacheRegistry) -> Self {
        Self::with_engine(registry, HeaderPolicyEngine::default_api_policies())
    }

    pub fn with_engine(registry: CacheRegistry, engine: HeaderPolicyEngine) -> Self {
        Self {
            coordinator: Arc::new(registry.coordinator()),
            registry,
            engine: Arc::new(engine),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails when any cache instance is configured with a zero TTL or capacity.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheRegistry::from_config(config)?))
    }

    fn resolve_instances(&self, names: Option<&[String]>) -> Result<Vec<Arc<dyn CacheInstance>>> {
        let Some(names) = names else {
            return Ok(self.registry.instances());
        };

        names
            .iter()
            .map(|name| {
                self.registry
                    .instance(name)
                    .ok_or_else(|| CacheError::UnknownInstance(name.clone()))
            })
            .collect()
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Returns a snapshot of every cache instance.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut snapshots = Vec::new();
    for instance in state.registry.instances() {
        snapshots.push((instance.name().to_string(), instance.stats().await));
    }

    Json(StatsResponse::from_snapshots(snapshots))
}

/// Handler for POST /invalidate
///
/// Removes every key containing the pattern from the named instances, or
/// from all instances when none are named.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let targets = state.resolve_instances(req.instances.as_deref())?;
    let removed = InvalidationCoordinator::invalidate_by_pattern(&targets, &req.pattern).await;
    info!(pattern = %req.pattern, removed, "Invalidated by pattern");

    Ok(Json(InvalidateResponse {
        pattern: req.pattern,
        removed,
        instances: names(&targets),
    }))
}

/// Handler for POST /records/changed
///
/// Purges entries tied to a changed record's subject and date range.
pub async fn record_changed_handler(
    State(state): State<AppState>,
    Json(req): Json<RecordChangedRequest>,
) -> Result<Json<RecordChangedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state
        .coordinator
        .on_record_changed(&req.subject_id, req.affected_range())
        .await;

    Ok(Json(RecordChangedResponse {
        subject_id: req.subject_id,
        removed,
    }))
}

/// Handler for DELETE /cache/:instance
pub async fn clear_instance_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    let targets = state.resolve_instances(Some(std::slice::from_ref(&name)))?;
    InvalidationCoordinator::invalidate_all(&targets).await;
    info!(instance = %name, "Cache instance cleared");

    Ok(Json(ClearResponse::new(names(&targets))))
}

/// Handler for DELETE /cache
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let targets = state.registry.instances();
    InvalidationCoordinator::invalidate_all(&targets).await;
    info!("All cache instances cleared");

    Json(ClearResponse::new(names(&targets)))
}

fn names(instances: &[Arc<dyn CacheInstance>]) -> Vec<String> {
    instances
        .iter()
        .map(|instance| instance.name().to_string())
        .collect()
}
