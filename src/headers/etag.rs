//! ETag Module
//!
//! Strong validators derived from the response body.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Quoted hex SHA-256 of `body`.
pub fn compute_etag(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// ETag of a value's JSON serialization.
pub fn compute_json_etag<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(compute_etag(&serde_json::to_vec(value)?))
}

/// Whether the client's `If-None-Match` value names exactly this ETag.
///
/// No weak comparison and no list parsing: anything other than an exact
/// match, including a missing header, means the client copy is not current.
pub fn etag_matches(etag: &str, if_none_match: Option<&str>) -> bool {
    if_none_match.is_some_and(|candidate| candidate == etag)
}
