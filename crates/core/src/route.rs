//! Routes and host-pattern matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::RouteId;

/// A host pattern: an exact hostname, or a single-label wildcard `*.suffix`.
///
/// Wildcards are restricted to this single-label form; anything else
/// (`*.*.example.com`, a bare `*`, a wildcard that isn't the leftmost label)
/// is rejected on parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostPattern {
    Exact(String),
    Wildcard { suffix: String },
}

impl HostPattern {
    /// Parse one pattern out of a domains CSV entry. Returns `None` if the
    /// pattern is not a bare hostname or a `*.suffix` wildcard.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(suffix) = raw.strip_prefix("*.") {
            if suffix.is_empty() || suffix.contains('*') {
                return None;
            }
            return Some(HostPattern::Wildcard { suffix: suffix.to_ascii_lowercase() });
        }
        if raw.contains('*') {
            return None;
        }
        Some(HostPattern::Exact(raw.to_ascii_lowercase()))
    }

    /// Whether this pattern matches a concrete request host.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self {
            HostPattern::Exact(h) => *h == host,
            HostPattern::Wildcard { suffix } => {
                host.len() > suffix.len() + 1
                    && host.ends_with(suffix.as_str())
                    && host.as_bytes()[host.len() - suffix.len() - 1] == b'.'
            }
        }
    }

    /// The map key this pattern is indexed under in a [`crate::RouteIndex`].
    pub fn index_key(&self) -> &str {
        match self {
            HostPattern::Exact(h) => h,
            HostPattern::Wildcard { suffix } => suffix,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, HostPattern::Wildcard { .. })
    }
}

/// A single route: host patterns, a path prefix, a backend, and optional
/// per-route attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub hosts: Vec<HostPattern>,
    pub path: String,
    pub backend_url: String,
    pub priority: i64,
    #[serde(default)]
    pub response_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub health: Option<HealthSpec>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSpec>,
    #[serde(default)]
    pub circuit_breaker: Option<CircuitBreakerSpec>,
}

impl Route {
    /// Validate syntactic invariants that don't require comparing against
    /// sibling routes (backend URL well-formed, path starts with `/`, at
    /// least one valid host pattern). Cross-route invariants (duplicate
    /// (host, path, priority)) are checked by the staging store across the
    /// whole staged view.
    pub fn validate_self(&self) -> Result<(), String> {
        if self.hosts.is_empty() {
            return Err("route has no valid host pattern".to_string());
        }
        if !self.path.starts_with('/') {
            return Err(format!("path must start with '/': {}", self.path));
        }
        let parsed = url::Url::parse(&self.backend_url)
            .map_err(|e| format!("invalid backend url {:?}: {e}", self.backend_url))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(format!("backend url must be http(s): {:?}", self.backend_url));
        }
        if parsed.host().is_none() {
            return Err(format!("backend url missing host: {:?}", self.backend_url));
        }
        Ok(())
    }

    /// Segment-aware path-prefix match: `/api` matches `/api` and `/api/x`
    /// but not `/apiary`.
    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        let route_path = route_path.trim_end_matches('/');
        if route_path.is_empty() {
            return true;
        }
        if request_path == route_path {
            return true;
        }
        request_path.starts_with(route_path)
            && request_path.as_bytes().get(route_path.len()) == Some(&b'/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSpec {
    pub path: String,
    pub interval_secs: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSpec {
    pub requests_per_second: f64,
    pub burst: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSpec {
    pub failure_threshold: u32,
    pub open_timeout_secs: u64,
    #[serde(default = "CircuitBreakerSpec::default_half_open_probes")]
    pub half_open_probes: u32,
}

impl CircuitBreakerSpec {
    fn default_half_open_probes() -> u32 {
        1
    }
}

/// Minimal URL parsing, inlined rather than pulling the `url` crate as a
/// hard dependency into every consumer of `Route` — mirrors the validation
/// the registry actually needs (scheme, host, optional path) without the
/// full IRI surface.
mod url {
    pub struct Url<'a> {
        scheme: &'a str,
        host: Option<&'a str>,
    }

    impl<'a> Url<'a> {
        pub fn parse(s: &'a str) -> Result<Self, String> {
            let (scheme, rest) = s.split_once("://").ok_or_else(|| "missing scheme".to_string())?;
            if scheme.is_empty() {
                return Err("empty scheme".to_string());
            }
            let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
            let host = authority.rsplit('@').next().filter(|h| !h.is_empty());
            Ok(Self { scheme, host })
        }

        pub fn scheme(&self) -> &str {
            self.scheme
        }

        pub fn host(&self) -> Option<&str> {
            self.host
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_host_pattern_matches_case_insensitively() {
        let p = HostPattern::parse("Example.com").unwrap();
        assert!(p.matches("example.com"));
        assert!(p.matches("EXAMPLE.COM"));
        assert!(!p.matches("other.com"));
    }

    #[test]
    fn wildcard_host_matches_single_label_only() {
        let p = HostPattern::parse("*.example.com").unwrap();
        assert!(p.matches("a.example.com"));
        assert!(p.matches("b.example.com"));
        assert!(!p.matches("example.com"));
        assert!(!p.matches("evilexample.com"));
    }

    #[test]
    fn multi_label_wildcards_are_rejected() {
        assert!(HostPattern::parse("*.*.example.com").is_none());
        assert!(HostPattern::parse("*").is_none());
        assert!(HostPattern::parse("a.*.example.com").is_none());
    }

    #[test]
    fn path_prefix_is_segment_aware() {
        assert!(Route::path_matches("/api", "/api"));
        assert!(Route::path_matches("/api", "/api/x"));
        assert!(!Route::path_matches("/api", "/apiary"));
    }

    #[test]
    fn backend_url_must_be_http_or_https_with_host() {
        let mut route = sample_route();
        route.backend_url = "ftp://example.com".to_string();
        assert!(route.validate_self().is_err());
        route.backend_url = "http://".to_string();
        assert!(route.validate_self().is_err());
        route.backend_url = "http://127.0.0.1:8080".to_string();
        assert!(route.validate_self().is_ok());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn label() -> impl Strategy<Value = String> {
            "[a-z][a-z0-9]{0,8}"
        }

        proptest! {
            #[test]
            fn wildcard_matches_any_single_label_under_its_suffix(sub in label(), suffix in label()) {
                let pattern = HostPattern::parse(&format!("*.{suffix}")).expect("valid wildcard");
                prop_assert!(pattern.matches(&format!("{sub}.{suffix}")));
                prop_assert!(!pattern.matches(&suffix));
            }

            #[test]
            fn exact_pattern_matches_regardless_of_host_case(host in label()) {
                let pattern = HostPattern::parse(&host).expect("valid exact host");
                prop_assert!(pattern.matches(&host.to_ascii_uppercase()));
                prop_assert!(pattern.matches(&host.to_ascii_lowercase()));
            }

            #[test]
            fn path_prefix_always_matches_itself(path in "/[a-z][a-z0-9/]{0,12}") {
                prop_assert!(Route::path_matches(&path, &path));
            }
        }
    }

    fn sample_route() -> Route {
        Route {
            id: RouteId::from_counter(1),
            hosts: vec![HostPattern::parse("example.com").unwrap()],
            path: "/api".to_string(),
            backend_url: "http://127.0.0.1:8080".to_string(),
            priority: 10,
            response_headers: Default::default(),
            options: Default::default(),
            health: None,
            rate_limit: None,
            circuit_breaker: None,
        }
    }
}
