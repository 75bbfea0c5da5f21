//! API Routes
//!
//! Configures the Axum router with all cache admin endpoints.

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, clear_instance_handler, health_handler, invalidate_handler,
    record_changed_handler, stats_handler, AppState,
};
use crate::headers::cache_headers_layer;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Per-instance cache statistics
/// - `POST /invalidate` - Remove keys matching a pattern
/// - `POST /records/changed` - Purge entries tied to a changed record
/// - `DELETE /cache/:instance` - Clear one cache instance
/// - `DELETE /cache` - Clear every cache instance
///
/// # Middleware
/// - Cache headers: policy `Cache-Control`, ETag and `304` handling
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let engine = state.engine.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/records/changed", post(record_changed_handler))
        .route("/cache", delete(clear_all_handler))
        .route("/cache/:instance", delete(clear_instance_handler))
        .layer(from_fn_with_state(engine, cache_headers_layer))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{header::CACHE_CONTROL, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=10");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "private, max-age=300, stale-while-revalidate=600"
        );
    }

    #[tokio::test]
    async fn test_invalidate_endpoint() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/invalidate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"pattern":"user:1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "no-store, no-cache, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_clear_unknown_instance() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cache/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
