//! Lifecycle event types for `SUBSCRIBE`/`EVENT` and the reference client's
//! typed event bus.
//!
//! The bus implementation itself (backed by `tokio::sync::broadcast`, since
//! it needs an async runtime to avoid blocking the command reader on a slow
//! subscriber) lives in `rrcp-registry::events`; this module only carries
//! the wire-serializable event vocabulary shared by both the registry and
//! any downstream consumer of `EVENT` frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{RouteId, SessionId};

/// The event kinds a client can name in a `SUBSCRIBE` CSV list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connected,
    Disconnected,
    Retrying,
    ExtendedRetry,
    Reconnected,
    RouteAdded,
    MaintenanceOk,
    ConfigApplied,
    ShuttingDown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::Retrying => "retrying",
            EventKind::ExtendedRetry => "extended_retry",
            EventKind::Reconnected => "reconnected",
            EventKind::RouteAdded => "route_added",
            EventKind::MaintenanceOk => "maintenance_ok",
            EventKind::ConfigApplied => "config_applied",
            EventKind::ShuttingDown => "shutting_down",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "connected" => EventKind::Connected,
            "disconnected" => EventKind::Disconnected,
            "retrying" => EventKind::Retrying,
            "extended_retry" => EventKind::ExtendedRetry,
            "reconnected" => EventKind::Reconnected,
            "route_added" => EventKind::RouteAdded,
            "maintenance_ok" => EventKind::MaintenanceOk,
            "config_applied" => EventKind::ConfigApplied,
            "shutting_down" => EventKind::ShuttingDown,
            _ => return None,
        })
    }
}

/// One emitted lifecycle event, addressed to a session, carrying an
/// arbitrary JSON payload (wire-encoded as `EVENT|<type>|<json>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub session_id: SessionId,
    pub kind: EventKind,
    pub payload: Value,
}

impl LifecycleEvent {
    pub fn route_added(session_id: SessionId, route_id: RouteId) -> Self {
        Self { session_id, kind: EventKind::RouteAdded, payload: serde_json::json!({ "route_id": route_id.as_str() }) }
    }

    pub fn maintenance_ok(session_id: SessionId, target: String) -> Self {
        Self { session_id, kind: EventKind::MaintenanceOk, payload: serde_json::json!({ "target": target }) }
    }

    pub fn config_applied(session_id: SessionId) -> Self {
        Self { session_id, kind: EventKind::ConfigApplied, payload: serde_json::json!({}) }
    }

    pub fn shutting_down() -> Self {
        Self { session_id: SessionId::from("*"), kind: EventKind::ShuttingDown, payload: serde_json::json!({}) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_round_trips_through_str() {
        for kind in [
            EventKind::Connected,
            EventKind::Disconnected,
            EventKind::Retrying,
            EventKind::ExtendedRetry,
            EventKind::Reconnected,
            EventKind::RouteAdded,
            EventKind::MaintenanceOk,
            EventKind::ConfigApplied,
            EventKind::ShuttingDown,
        ] {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
    }
}
