//! Bypass Module
//!
//! Decides from the request alone whether caching must be skipped,
//! independently of any endpoint policy.

use axum::http::{
    header::{CACHE_CONTROL, PRAGMA},
    HeaderMap, Method, Uri,
};

/// Query parameters clients add to force a fresh response.
pub const CACHE_BUST_PARAMS: &[&str] = &["nocache", "_t"];

/// True when the response must be treated as `no-store`.
///
/// That is the case for any non-read method, for requests carrying a
/// cache-busting query parameter, and for requests that themselves ask for
/// `no-cache`/`no-store`.
pub fn should_bypass(method: &Method, uri: &Uri, headers: &HeaderMap) -> bool {
    !is_safe_read(method) || has_cache_bust_param(uri) || requests_no_cache(headers)
}

fn is_safe_read(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn has_cache_bust_param(uri: &Uri) -> bool {
    uri.query().is_some_and(|query| {
        query
            .split('&')
            .map(|pair| pair.split_once('=').map_or(pair, |(name, _)| name))
            .any(|name| CACHE_BUST_PARAMS.contains(&name))
    })
}

fn requests_no_cache(headers: &HeaderMap) -> bool {
    let cache_control = headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|directive| {
            directive.eq_ignore_ascii_case("no-cache") || directive.eq_ignore_ascii_case("no-store")
        });

    let pragma = headers
        .get(PRAGMA)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("no-cache"));

    cache_control || pragma
}
