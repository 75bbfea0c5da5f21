//! Header Policy Module
//!
//! Maps endpoints to client-side caching policies and renders the matching
//! response headers.

use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    HeaderMap, HeaderName, HeaderValue,
};
use serde::{Deserialize, Serialize};

// == Endpoint Cache Policy ==
/// How clients and intermediaries may cache one endpoint's responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointCachePolicy {
    pub max_age: Option<u32>,
    pub stale_while_revalidate: Option<u32>,
    pub must_revalidate: bool,
    pub private: bool,
    pub no_store: bool,
}

impl EndpointCachePolicy {
    /// Forbids caching entirely.
    pub fn no_store() -> Self {
        Self {
            no_store: true,
            ..Self::default()
        }
    }

    /// Cacheable by the client only.
    pub fn private(max_age: u32) -> Self {
        Self {
            max_age: Some(max_age),
            private: true,
            ..Self::default()
        }
    }

    /// Cacheable by clients and shared caches.
    pub fn public(max_age: u32) -> Self {
        Self {
            max_age: Some(max_age),
            ..Self::default()
        }
    }

    pub fn stale_while_revalidate(mut self, seconds: u32) -> Self {
        self.stale_while_revalidate = Some(seconds);
        self
    }

    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// Renders the `Cache-Control` value, directives in fixed order.
    pub fn cache_control(&self) -> String {
        if self.no_store {
            return NO_STORE_DIRECTIVES.to_string();
        }

        let visibility = if self.private { "private" } else { "public" };
        let mut directives = vec![visibility.to_string()];
        if let Some(max_age) = self.max_age {
            directives.push(format!("max-age={max_age}"));
        }
        if let Some(swr) = self.stale_while_revalidate {
            directives.push(format!("stale-while-revalidate={swr}"));
        }
        if self.must_revalidate {
            directives.push("must-revalidate".to_string());
        }
        directives.join(", ")
    }
}

const NO_STORE_DIRECTIVES: &str = "no-store, no-cache, must-revalidate";

// == Cache Headers ==
/// Ordered set of response headers produced for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheHeaders(Vec<(HeaderName, String)>);

impl CacheHeaders {
    fn push(&mut self, name: HeaderName, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    /// Value of a header by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(header, _)| header.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.0.iter().map(|(name, value)| (name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges into `headers`, replacing any existing values.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.0 {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(name.clone(), value);
            }
        }
    }
}

// == Header Policy Engine ==
/// Table of endpoint policies, fixed once built.
#[derive(Debug, Clone, Default)]
pub struct HeaderPolicyEngine {
    policies: Vec<(String, EndpointCachePolicy)>,
}

impl HeaderPolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `policy` for every endpoint starting with `path_prefix`.
    pub fn with_policy(mut self, path_prefix: impl Into<String>, policy: EndpointCachePolicy) -> Self {
        self.policies.push((path_prefix.into(), policy));
        self
    }

    /// Policies for the application's read endpoints and the admin surface.
    pub fn default_api_policies() -> Self {
        Self::new()
            .with_policy("/health", EndpointCachePolicy::public(10))
            .with_policy(
                "/stats",
                EndpointCachePolicy::private(300).stale_while_revalidate(600),
            )
            .with_policy("/api/auth", EndpointCachePolicy::no_store())
            .with_policy("/api/users/me", EndpointCachePolicy::private(60).must_revalidate())
            .with_policy(
                "/api/leave-balances",
                EndpointCachePolicy::private(300).stale_while_revalidate(600),
            )
            .with_policy("/api/leave-requests", EndpointCachePolicy::private(60).must_revalidate())
            .with_policy(
                "/api/calendar",
                EndpointCachePolicy::private(120).stale_while_revalidate(300),
            )
            .with_policy(
                "/api/holidays",
                EndpointCachePolicy::public(3600).stale_while_revalidate(86_400),
            )
    }

    // == Resolve ==
    /// Finds the policy for `endpoint`: an exact match wins, otherwise the
    /// longest registered prefix.
    pub fn resolve(&self, endpoint: &str) -> Option<&EndpointCachePolicy> {
        if let Some((_, policy)) = self.policies.iter().find(|(prefix, _)| prefix == endpoint) {
            return Some(policy);
        }

        self.policies
            .iter()
            .filter(|(prefix, _)| endpoint.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, policy)| policy)
    }

    // == Generate Headers ==
    /// Headers for a response from `endpoint`, or from `override_policy` when given.
    ///
    /// Endpoints without a policy get `Cache-Control: no-store`.
    pub fn generate_headers(
        &self,
        endpoint: &str,
        override_policy: Option<&EndpointCachePolicy>,
    ) -> CacheHeaders {
        let mut headers = CacheHeaders::default();

        let Some(policy) = override_policy.or_else(|| self.resolve(endpoint)) else {
            headers.push(CACHE_CONTROL, "no-store");
            return headers;
        };

        if policy.no_store {
            headers.push(CACHE_CONTROL, NO_STORE_DIRECTIVES);
            headers.push(PRAGMA, "no-cache");
            headers.push(EXPIRES, "0");
        } else {
            headers.push(CACHE_CONTROL, policy.cache_control());
        }
        headers
    }
}
