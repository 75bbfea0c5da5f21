//! API Module
//!
//! HTTP handlers and routing for the cache admin REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Per-instance cache statistics
//! - `POST /invalidate` - Remove keys matching a pattern
//! - `POST /records/changed` - Purge entries tied to a changed record
//! - `DELETE /cache/:instance` - Clear one cache instance
//! - `DELETE /cache` - Clear every cache instance

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
