//! Thin wrapper over [`rrcp_core::RouteIndex::resolve`] that extracts host
//! and path from an incoming request.

use axum::http::Uri;
use rrcp_core::{RouteEntry, RouteIndex};

/// Resolve `host`/`uri` against `index`. Returns a clone of the matching
/// entry (the caller holds only a momentary `Guard` over the `ArcSwap`
/// snapshot, and the entry needs to outlive it across the subsequent
/// `await` points of the dispatch decision).
pub fn resolve(index: &RouteIndex, host: &str, uri: &Uri) -> Option<RouteEntry> {
    index.resolve(host, uri.path()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrcp_core::{HostPattern, Route, RouteId, SessionId};
    use std::collections::HashMap;

    fn route(id: &str, host: &str, path: &str) -> Route {
        Route {
            id: RouteId::from(id),
            hosts: vec![HostPattern::parse(host).unwrap()],
            path: path.to_string(),
            backend_url: "http://127.0.0.1:9000".to_string(),
            priority: 1,
            response_headers: Default::default(),
            options: Default::default(),
            health: None,
            rate_limit: None,
            circuit_breaker: None,
        }
    }

    #[test]
    fn resolves_against_exact_host_and_path() {
        let mut exact = HashMap::new();
        exact.insert(
            "a.com".to_string(),
            vec![RouteEntry {
                session_id: SessionId::from("s1"),
                route: route("r1", "a.com", "/api"),
                in_maintenance: false,
                maintenance_page_url: None,
                drain_admission_probability: 1.0,
                drain_completed: false,
                circuit_admits: true,
            }],
        );
        let index = RouteIndex::new(exact, HashMap::new(), 1);
        let uri: Uri = "/api/widgets".parse().unwrap();
        let entry = resolve(&index, "a.com", &uri).unwrap();
        assert_eq!(entry.route.id.as_str(), "r1");
    }

    #[test]
    fn no_match_returns_none() {
        let index = RouteIndex::default();
        let uri: Uri = "/".parse().unwrap();
        assert!(resolve(&index, "nope.com", &uri).is_none());
    }
}
