//! Per-session maintenance set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::RouteId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceSet {
    pub route_ids: HashSet<RouteId>,
    pub page_url: Option<String>,
}

impl MaintenanceSet {
    /// `MAINT_ENTER`: add `targets` (or the `ALL` sentinel) to the set,
    /// optionally recording an upstream maintenance-page URL.
    pub fn enter(&mut self, targets: &[RouteId], page_url: Option<String>) {
        for id in targets {
            self.route_ids.insert(id.clone());
        }
        if page_url.is_some() {
            self.page_url = page_url;
        }
    }

    /// `MAINT_EXIT`: remove `targets` from the set.
    pub fn exit(&mut self, targets: &[RouteId]) {
        for id in targets {
            self.route_ids.remove(id);
        }
        if self.route_ids.is_empty() {
            self.page_url = None;
        }
    }

    /// Whether `route_id` is shadowed by maintenance: either named
    /// explicitly, or the `ALL` sentinel is present.
    pub fn covers(&self, route_id: &RouteId) -> bool {
        self.route_ids.contains(route_id) || self.route_ids.iter().any(|id| RouteId::is_all_sentinel(id.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.route_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_shadows_every_route() {
        let mut set = MaintenanceSet::default();
        set.enter(&[RouteId::from("ALL")], None);
        assert!(set.covers(&RouteId::from("r1")));
        assert!(set.covers(&RouteId::from("r999")));
    }

    #[test]
    fn enter_then_exit_returns_to_serving() {
        let mut set = MaintenanceSet::default();
        set.enter(&[RouteId::from("r1")], Some("http://example.com/maint".into()));
        assert!(set.covers(&RouteId::from("r1")));
        set.exit(&[RouteId::from("r1")]);
        assert!(!set.covers(&RouteId::from("r1")));
        assert!(set.page_url.is_none());
    }
}
