//! Builds a [`rrcp_core::RouteIndex`] snapshot from the union of every
//! session's active configuration view.

use std::collections::HashMap;
use std::time::Instant;

use rrcp_core::{RouteEntry, RouteIndex, SessionTable};

/// Build a fresh index at `generation`. Candidates within a host bucket are
/// sorted by (priority desc, path length desc, route ID asc) so matching is
/// deterministic across rebuilds without relying on `HashMap` iteration
/// order or cross-session insertion order.
///
/// The dataplane has no access to live `Session` state, so each candidate's
/// maintenance/drain/circuit-breaker status is snapshotted here, at
/// publish time, onto the entry itself.
pub fn build(sessions: &SessionTable, generation: u64, now: Instant) -> RouteIndex {
    let mut exact: HashMap<String, Vec<RouteEntry>> = HashMap::new();
    let mut wildcard: HashMap<String, Vec<RouteEntry>> = HashMap::new();

    for session in sessions.all() {
        let maintenance = session.maintenance_snapshot();
        for route in session.active_routes().into_values() {
            let entry_template = RouteEntry {
                session_id: session.id.clone(),
                route: route.clone(),
                in_maintenance: maintenance.covers(&route.id),
                maintenance_page_url: maintenance.page_url.clone(),
                drain_admission_probability: session.drain_admission_probability(now),
                drain_completed: session.is_drain_completed(now),
                circuit_admits: session.circuit_should_admit(&route.id, now),
            };
            for host in route.hosts.clone() {
                let entry = RouteEntry { route: route.clone(), ..entry_template.clone() };
                let bucket = if host.is_wildcard() { &mut wildcard } else { &mut exact };
                bucket.entry(host.index_key().to_string()).or_default().push(entry);
            }
        }
    }

    for candidates in exact.values_mut().chain(wildcard.values_mut()) {
        candidates.sort_by(|a, b| {
            b.route.priority.cmp(&a.route.priority).then(b.route.path.len().cmp(&a.route.path.len())).then(a.route.id.cmp(&b.route.id))
        });
    }

    RouteIndex::new(exact, wildcard, generation)
}
