//! Headers Module
//!
//! HTTP cache-control policies for responses. This governs caching by
//! clients and intermediaries and is independent of the in-memory stores.

mod bypass;
mod etag;
pub mod middleware;
mod policy;

pub use bypass::{should_bypass, CACHE_BUST_PARAMS};
pub use etag::{compute_etag, compute_json_etag, etag_matches};
pub use middleware::cache_headers_layer;
pub use policy::{CacheHeaders, EndpointCachePolicy, HeaderPolicyEngine};
