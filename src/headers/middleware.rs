//! Cache header middleware.
//!
//! Applies endpoint cache policies, ETags and conditional `304 Not Modified`
//! replies to every response passing through the router.

use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, ETAG, IF_NONE_MATCH},
        HeaderName, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument, warn};

use super::{compute_etag, etag_matches, should_bypass, EndpointCachePolicy, HeaderPolicyEngine};

/// Marks responses whose cache headers were set by this layer.
pub const X_CACHE_OPTIMIZED: HeaderName = HeaderName::from_static("x-cache-optimized");
/// RFC 3339 time at which the response was produced.
pub const X_RESPONSE_GENERATED_AT: HeaderName = HeaderName::from_static("x-response-generated-at");

/// Largest body buffered to compute an ETag. Larger or unsized bodies pass
/// through untouched and get no ETag.
const MAX_ETAG_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Middleware for response cache headers.
///
/// Bypassed requests (non-read methods, cache-busting query parameters,
/// client `no-cache`) get `no-store` headers and no ETag. Successful
/// responses to the rest carry a body ETag, and a request whose
/// `If-None-Match` equals it receives an empty `304`. Bodies too large to
/// hash are streamed through with policy headers but no ETag.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn cache_headers_layer(
    State(engine): State<Arc<HeaderPolicyEngine>>,
    request: Request,
    next: Next,
) -> Response {
    let bypass = should_bypass(request.method(), request.uri(), request.headers());
    let path = request.uri().path().to_string();
    let if_none_match = request
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;
    let (mut parts, mut body) = response.into_parts();

    let wants_etag = !bypass && parts.status.is_success();
    let hashable = body
        .size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_ETAG_BODY_BYTES as u64);

    if wants_etag && !hashable {
        debug!("Body too large or unsized, skipping ETag");
    } else if wants_etag {
        // Size is already bounded, so this only fails if the handler's body errors
        let bytes = match axum::body::to_bytes(body, MAX_ETAG_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "Response body failed while buffering");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let etag = compute_etag(&bytes);
        if etag_matches(&etag, if_none_match.as_deref()) {
            debug!(etag = %etag, "Client copy is current");
            parts.status = StatusCode::NOT_MODIFIED;
            parts.headers.remove(CONTENT_LENGTH);
            body = Body::empty();
        } else {
            body = Body::from(bytes);
        }

        if let Ok(value) = HeaderValue::from_str(&etag) {
            parts.headers.insert(ETAG, value);
        }
    }

    let override_policy = bypass.then(EndpointCachePolicy::no_store);
    engine
        .generate_headers(&path, override_policy.as_ref())
        .apply_to(&mut parts.headers);

    parts
        .headers
        .insert(X_CACHE_OPTIMIZED, HeaderValue::from_static("true"));
    if let Ok(value) = HeaderValue::from_str(&chrono::Utc::now().to_rfc3339()) {
        parts.headers.insert(X_RESPONSE_GENERATED_AT, value);
    }

    Response::from_parts(parts, body)
}
