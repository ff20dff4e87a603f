//! Configuration bundles: the active and staged views of a session's routes,
//! headers, and options.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::id::RouteId;
use crate::route::Route;

/// One view (active or staged) of a session's configuration.
///
/// Deep-cloned whenever it crosses a view boundary (stage-from-active on
/// apply's reset, rollback-from-active) so the two views never share a
/// mutable reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub routes: HashMap<RouteId, Route>,
    pub headers: BTreeMap<String, String>,
    pub options: BTreeMap<String, String>,
    /// Staged-view only: routes marked for removal on apply.
    #[serde(default)]
    pub removed: std::collections::HashSet<RouteId>,
}

impl ConfigBundle {
    /// Deep-copy this view, dropping any pending-removal marks (used to
    /// build a fresh staged view from an active one).
    pub fn clone_as_staged_base(&self) -> Self {
        ConfigBundle { routes: self.routes.clone(), headers: self.headers.clone(), options: self.options.clone(), removed: Default::default() }
    }

    /// Apply the pending removals and produce the route map a
    /// `CONFIG_APPLY` would publish as the new active view.
    pub fn resolved_routes(&self) -> HashMap<RouteId, Route> {
        self.routes.iter().filter(|(id, _)| !self.removed.contains(*id)).map(|(id, r)| (id.clone(), r.clone())).collect()
    }

    /// Validate cross-route invariants: route IDs unique (guaranteed by
    /// the map), backend URLs well-formed, and no two routes sharing
    /// (host, path, priority).
    pub fn validate(&self) -> Result<(), String> {
        let routes = self.resolved_routes();
        for route in routes.values() {
            route.validate_self()?;
        }
        let mut seen: Vec<(String, String, i64, RouteId)> = Vec::new();
        for route in routes.values() {
            for host in &route.hosts {
                let key = (host.index_key().to_string(), route.path.clone(), route.priority, route.id.clone());
                if let Some((_, _, _, other)) =
                    seen.iter().find(|(h, p, pr, id)| *h == key.0 && *p == key.1 && *pr == key.2 && *id != key.3)
                {
                    return Err(format!("duplicate_route: {} and {} both claim ({}, {}, {})", other, route.id, key.0, key.1, key.2));
                }
                seen.push(key);
            }
        }
        Ok(())
    }
}

/// A changed route field, old vs. new (for `CONFIG_DIFF`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteFieldDiff {
    pub route_id: RouteId,
    pub field: String,
    pub old: String,
    pub new: String,
}

/// Structured diff between a staged and active view, as returned by
/// `CONFIG_DIFF`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDiff {
    pub added_routes: Vec<Route>,
    pub removed_route_ids: Vec<RouteId>,
    pub changed_routes: Vec<RouteFieldDiff>,
    pub headers_added: BTreeMap<String, String>,
    pub headers_removed: Vec<String>,
    pub options_added: BTreeMap<String, String>,
    pub options_removed: Vec<String>,
}

impl ConfigDiff {
    pub fn compute(active: &ConfigBundle, staged: &ConfigBundle) -> Self {
        let mut diff = ConfigDiff::default();
        let staged_resolved = staged.resolved_routes();

        for (id, route) in &staged_resolved {
            match active.routes.get(id) {
                None => diff.added_routes.push(route.clone()),
                Some(old) => diff.changed_routes.extend(field_diffs(old, route)),
            }
        }
        for id in active.routes.keys() {
            if !staged_resolved.contains_key(id) {
                diff.removed_route_ids.push(id.clone());
            }
        }
        diff.removed_route_ids.sort();

        for (k, v) in &staged.headers {
            if active.headers.get(k) != Some(v) {
                diff.headers_added.insert(k.clone(), v.clone());
            }
        }
        for k in active.headers.keys() {
            if !staged.headers.contains_key(k) {
                diff.headers_removed.push(k.clone());
            }
        }
        for (k, v) in &staged.options {
            if active.options.get(k) != Some(v) {
                diff.options_added.insert(k.clone(), v.clone());
            }
        }
        for k in active.options.keys() {
            if !staged.options.contains_key(k) {
                diff.options_removed.push(k.clone());
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added_routes.is_empty()
            && self.removed_route_ids.is_empty()
            && self.changed_routes.is_empty()
            && self.headers_added.is_empty()
            && self.headers_removed.is_empty()
            && self.options_added.is_empty()
            && self.options_removed.is_empty()
    }
}

fn field_diffs(old: &Route, new: &Route) -> Vec<RouteFieldDiff> {
    let mut diffs = Vec::new();
    macro_rules! check {
        ($field:ident, $name:literal) => {
            let old_s = format!("{:?}", old.$field);
            let new_s = format!("{:?}", new.$field);
            if old_s != new_s {
                diffs.push(RouteFieldDiff { route_id: new.id.clone(), field: $name.to_string(), old: old_s, new: new_s });
            }
        };
    }
    check!(hosts, "hosts");
    check!(path, "path");
    check!(backend_url, "backend_url");
    check!(priority, "priority");
    check!(response_headers, "response_headers");
    check!(options, "options");
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::HostPattern;

    fn route(id: &str, host: &str, path: &str, priority: i64, backend: &str) -> Route {
        Route {
            id: RouteId::from(id),
            hosts: vec![HostPattern::parse(host).unwrap()],
            path: path.to_string(),
            backend_url: backend.to_string(),
            priority,
            response_headers: Default::default(),
            options: Default::default(),
            health: None,
            rate_limit: None,
            circuit_breaker: None,
        }
    }

    #[test]
    fn duplicate_host_path_priority_rejected() {
        let mut bundle = ConfigBundle::default();
        bundle.routes.insert(RouteId::from("r1"), route("r1", "example.com", "/api", 10, "http://127.0.0.1:8080"));
        bundle.routes.insert(RouteId::from("r2"), route("r2", "example.com", "/api", 10, "http://127.0.0.1:9999"));
        let err = bundle.validate().unwrap_err();
        assert!(err.starts_with("duplicate_route"));
    }

    #[test]
    fn diff_reports_additions_and_removals() {
        let mut active = ConfigBundle::default();
        active.routes.insert(RouteId::from("r1"), route("r1", "a.com", "/a", 1, "http://127.0.0.1:1"));

        let mut staged = active.clone_as_staged_base();
        staged.removed.insert(RouteId::from("r1"));
        staged.routes.insert(RouteId::from("r2"), route("r2", "b.com", "/b", 1, "http://127.0.0.1:2"));

        let diff = ConfigDiff::compute(&active, &staged);
        assert_eq!(diff.removed_route_ids, vec![RouteId::from("r1")]);
        assert_eq!(diff.added_routes.len(), 1);
        assert_eq!(diff.added_routes[0].id, RouteId::from("r2"));
    }

    #[test]
    fn rollback_to_unchanged_active_produces_empty_diff() {
        let mut active = ConfigBundle::default();
        active.routes.insert(RouteId::from("r1"), route("r1", "a.com", "/a", 1, "http://127.0.0.1:1"));
        let staged = active.clone_as_staged_base();
        let diff = ConfigDiff::compute(&active, &staged);
        assert!(diff.is_empty());
    }
}
