//! The derived, read-optimized route index the HTTP dispatcher consults.
//!
//! [`RouteIndex`] itself is just data: a sorted-by-construction set of
//! candidate lists keyed by host. Building one from the union of all
//! sessions' active views is `rrcp-registry`'s job (it needs the session
//! table); matching a request against an already-built index needs nothing
//! but this type, so it lives in `rrcp-core` where both the registry and
//! the dataplane can use it without the dataplane depending on the whole
//! registry crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::SessionId;
use crate::route::Route;

/// One candidate a host/path match can resolve to.
///
/// The dataplane process never sees a live [`crate::Session`] — it only
/// polls this index — so whatever session-level state its dispatch
/// decision needs (maintenance, drain, circuit breaker) has to ride along
/// as a snapshot taken at publish time rather than be looked up live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub session_id: SessionId,
    pub route: Route,
    pub in_maintenance: bool,
    pub maintenance_page_url: Option<String>,
    /// 1.0 outside a drain; decays to 0.0 over the drain's configured
    /// duration. The dataplane rolls a random admission draw against this.
    pub drain_admission_probability: f64,
    pub drain_completed: bool,
    /// Whether the session's circuit breaker for this route currently
    /// admits requests (closed, or half-open with budget remaining).
    pub circuit_admits: bool,
}

/// An immutable, published snapshot of the route table. Updates publish a
/// new snapshot rather than mutating one in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteIndex {
    /// Exact-host candidates, sorted by (priority desc, path length desc,
    /// insertion order asc).
    exact: HashMap<String, Vec<RouteEntry>>,
    /// Wildcard-host candidates (keyed by the wildcard's suffix), same
    /// ordering, consulted on exact-host miss.
    wildcard: HashMap<String, Vec<RouteEntry>>,
    pub generation: u64,
}

impl RouteIndex {
    pub fn new(exact: HashMap<String, Vec<RouteEntry>>, wildcard: HashMap<String, Vec<RouteEntry>>, generation: u64) -> Self {
        Self { exact, wildcard, generation }
    }

    /// Match an incoming request's host and path against the index:
    /// exact-host candidates first, then wildcard-host candidates on miss.
    pub fn resolve(&self, host: &str, path: &str) -> Option<&RouteEntry> {
        let host = host.to_ascii_lowercase();
        if let Some(candidates) = self.exact.get(&host) {
            if let Some(entry) = candidates.iter().find(|e| Route::path_matches(&e.route.path, path)) {
                return Some(entry);
            }
        }
        for (suffix, candidates) in &self.wildcard {
            if host.len() > suffix.len() + 1 && host.ends_with(suffix.as_str()) && host.as_bytes()[host.len() - suffix.len() - 1] == b'.' {
                if let Some(entry) = candidates.iter().find(|e| Route::path_matches(&e.route.path, path)) {
                    return Some(entry);
                }
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcard.is_empty()
    }

    /// Every route ID currently present in the index, for pruning
    /// dataplane-local per-route state (rate limiters, circuit breakers)
    /// that has fallen out of the published snapshot.
    pub fn known_route_ids(&self) -> std::collections::HashSet<crate::id::RouteId> {
        self.exact
            .values()
            .chain(self.wildcard.values())
            .flatten()
            .map(|entry| entry.route.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::HostPattern;

    fn entry(session: &str, id: &str, host: &str, path: &str, priority: i64, backend: &str) -> RouteEntry {
        RouteEntry {
            session_id: SessionId::from(session),
            route: Route {
                id: id.into(),
                hosts: vec![HostPattern::parse(host).unwrap()],
                path: path.to_string(),
                backend_url: backend.to_string(),
                priority,
                response_headers: Default::default(),
                options: Default::default(),
                health: None,
                rate_limit: None,
                circuit_breaker: None,
            },
            in_maintenance: false,
            maintenance_page_url: None,
            drain_admission_probability: 1.0,
            drain_completed: false,
            circuit_admits: true,
        }
    }

    #[test]
    fn exact_host_beats_wildcard_on_miss_fallback() {
        let mut exact = HashMap::new();
        exact.insert("a.example.com".to_string(), vec![entry("s1", "r1", "a.example.com", "/", 1, "http://x")]);
        let mut wildcard = HashMap::new();
        wildcard.insert("example.com".to_string(), vec![entry("s1", "r2", "*.example.com", "/", 1, "http://y")]);
        let index = RouteIndex::new(exact, wildcard, 1);

        let matched = index.resolve("a.example.com", "/foo").unwrap();
        assert_eq!(matched.route.id.as_str(), "r1");

        let matched = index.resolve("b.example.com", "/foo").unwrap();
        assert_eq!(matched.route.id.as_str(), "r2");
    }

    #[test]
    fn no_match_returns_none_for_404() {
        let index = RouteIndex::default();
        assert!(index.resolve("nope.example.com", "/").is_none());
    }

    #[test]
    fn path_prefix_selects_first_eligible_candidate() {
        let mut exact = HashMap::new();
        exact.insert(
            "a.com".to_string(),
            vec![entry("s1", "r1", "a.com", "/api/v2", 20, "http://hi"), entry("s1", "r2", "a.com", "/api", 10, "http://lo")],
        );
        let index = RouteIndex::new(exact, HashMap::new(), 1);
        assert_eq!(index.resolve("a.com", "/api/v2/x").unwrap().route.id.as_str(), "r1");
        assert_eq!(index.resolve("a.com", "/api/v1").unwrap().route.id.as_str(), "r2");
    }
}
