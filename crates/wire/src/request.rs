use rrcp_core::{RouteId, SessionId};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::frame::split_fields;
use crate::verb::Verb;

/// A parsed request frame, one variant per verb, carrying its positional
/// fields already split out of the raw line.
#[derive(Debug, Clone)]
pub enum Request {
    Register { service: String, instance: String, maintenance_port: u16, metadata: Value },
    Reconnect { session_id: SessionId },
    Ping { session_id: SessionId },
    SessionInfo { session_id: SessionId },
    ClientShutdown { session_id: SessionId },
    RouteAdd { session_id: SessionId, domains_csv: String, path: String, backend_url: String, priority: i64 },
    RouteAddBulk { session_id: SessionId, routes_json: Value },
    RouteUpdate { session_id: SessionId, route_id: RouteId, fields_json: Value },
    RouteRemove { session_id: SessionId, route_id: RouteId },
    RouteList { session_id: SessionId },
    HeadersSet { session_id: SessionId, headers_json: Value },
    HeadersRemove { session_id: SessionId, keys_csv: String },
    OptionsSet { session_id: SessionId, options_json: Value },
    OptionsRemove { session_id: SessionId, keys_csv: String },
    HealthSet { session_id: SessionId, route_id: RouteId, spec_json: Value },
    RatelimitSet { session_id: SessionId, route_id: RouteId, spec_json: Value },
    CircuitBreakerSet { session_id: SessionId, route_id: RouteId, spec_json: Value },
    CircuitBreakerStatus { session_id: SessionId, route_id: RouteId },
    CircuitBreakerReset { session_id: SessionId, route_id: RouteId },
    ConfigValidate { session_id: SessionId },
    ConfigApply { session_id: SessionId },
    ConfigRollback { session_id: SessionId },
    ConfigDiff { session_id: SessionId },
    ConfigApplyPartial { session_id: SessionId, scopes_csv: String },
    DrainStart { session_id: SessionId, duration_secs: u64 },
    DrainStatus { session_id: SessionId },
    DrainCancel { session_id: SessionId },
    MaintEnter { session_id: SessionId, targets_csv: String, page_url: Option<String> },
    MaintExit { session_id: SessionId, targets_csv: String },
    MaintStatus { session_id: SessionId },
    StatsGet { session_id: SessionId },
    BackendTest { session_id: SessionId, url: String },
    Subscribe { session_id: SessionId, event_types_csv: String },
    Unsubscribe { session_id: SessionId },
}

impl Request {
    pub fn verb(&self) -> Verb {
        match self {
            Request::Register { .. } => Verb::Register,
            Request::Reconnect { .. } => Verb::Reconnect,
            Request::Ping { .. } => Verb::Ping,
            Request::SessionInfo { .. } => Verb::SessionInfo,
            Request::ClientShutdown { .. } => Verb::ClientShutdown,
            Request::RouteAdd { .. } => Verb::RouteAdd,
            Request::RouteAddBulk { .. } => Verb::RouteAddBulk,
            Request::RouteUpdate { .. } => Verb::RouteUpdate,
            Request::RouteRemove { .. } => Verb::RouteRemove,
            Request::RouteList { .. } => Verb::RouteList,
            Request::HeadersSet { .. } => Verb::HeadersSet,
            Request::HeadersRemove { .. } => Verb::HeadersRemove,
            Request::OptionsSet { .. } => Verb::OptionsSet,
            Request::OptionsRemove { .. } => Verb::OptionsRemove,
            Request::HealthSet { .. } => Verb::HealthSet,
            Request::RatelimitSet { .. } => Verb::RatelimitSet,
            Request::CircuitBreakerSet { .. } => Verb::CircuitBreakerSet,
            Request::CircuitBreakerStatus { .. } => Verb::CircuitBreakerStatus,
            Request::CircuitBreakerReset { .. } => Verb::CircuitBreakerReset,
            Request::ConfigValidate { .. } => Verb::ConfigValidate,
            Request::ConfigApply { .. } => Verb::ConfigApply,
            Request::ConfigRollback { .. } => Verb::ConfigRollback,
            Request::ConfigDiff { .. } => Verb::ConfigDiff,
            Request::ConfigApplyPartial { .. } => Verb::ConfigApplyPartial,
            Request::DrainStart { .. } => Verb::DrainStart,
            Request::DrainStatus { .. } => Verb::DrainStatus,
            Request::DrainCancel { .. } => Verb::DrainCancel,
            Request::MaintEnter { .. } => Verb::MaintEnter,
            Request::MaintExit { .. } => Verb::MaintExit,
            Request::MaintStatus { .. } => Verb::MaintStatus,
            Request::StatsGet { .. } => Verb::StatsGet,
            Request::BackendTest { .. } => Verb::BackendTest,
            Request::Subscribe { .. } => Verb::Subscribe,
            Request::Unsubscribe { .. } => Verb::Unsubscribe,
        }
    }

    /// The session ID field, for every verb except `REGISTER` (which has
    /// none yet — it's the operation that creates one).
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Request::Register { .. } => None,
            Request::Reconnect { session_id }
            | Request::Ping { session_id }
            | Request::SessionInfo { session_id }
            | Request::ClientShutdown { session_id }
            | Request::RouteAdd { session_id, .. }
            | Request::RouteAddBulk { session_id, .. }
            | Request::RouteUpdate { session_id, .. }
            | Request::RouteRemove { session_id, .. }
            | Request::RouteList { session_id }
            | Request::HeadersSet { session_id, .. }
            | Request::HeadersRemove { session_id, .. }
            | Request::OptionsSet { session_id, .. }
            | Request::OptionsRemove { session_id, .. }
            | Request::HealthSet { session_id, .. }
            | Request::RatelimitSet { session_id, .. }
            | Request::CircuitBreakerSet { session_id, .. }
            | Request::CircuitBreakerStatus { session_id, .. }
            | Request::CircuitBreakerReset { session_id, .. }
            | Request::ConfigValidate { session_id }
            | Request::ConfigApply { session_id }
            | Request::ConfigRollback { session_id }
            | Request::ConfigDiff { session_id }
            | Request::ConfigApplyPartial { session_id, .. }
            | Request::DrainStart { session_id, .. }
            | Request::DrainStatus { session_id }
            | Request::DrainCancel { session_id }
            | Request::MaintEnter { session_id, .. }
            | Request::MaintExit { session_id, .. }
            | Request::MaintStatus { session_id }
            | Request::StatsGet { session_id }
            | Request::BackendTest { session_id, .. }
            | Request::Subscribe { session_id, .. }
            | Request::Unsubscribe { session_id } => Some(session_id),
        }
    }

    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let verb_str = line.split('|').next().unwrap_or("");
        let verb = Verb::parse(verb_str).ok_or_else(|| ProtocolError::UnknownVerb(verb_str.to_string()))?;
        let fields = split_fields(line, verb.max_fields());

        let field = |i: usize| -> Result<&str, ProtocolError> {
            fields.get(i).copied().ok_or_else(|| ProtocolError::BadArguments(format!("{} missing field {i}", verb.as_str())))
        };
        let parse_json = |s: &str| -> Result<Value, ProtocolError> {
            serde_json::from_str(s).map_err(ProtocolError::MalformedJson)
        };
        let parse_u16 = |s: &str| -> Result<u16, ProtocolError> {
            s.parse().map_err(|_| ProtocolError::BadArguments(format!("not a valid port: {s:?}")))
        };
        let parse_i64 = |s: &str| -> Result<i64, ProtocolError> {
            s.parse().map_err(|_| ProtocolError::BadArguments(format!("not a valid integer: {s:?}")))
        };
        let parse_u64 = |s: &str| -> Result<u64, ProtocolError> {
            s.parse().map_err(|_| ProtocolError::BadArguments(format!("not a valid integer: {s:?}")))
        };

        Ok(match verb {
            Verb::Register => Request::Register {
                service: field(1)?.to_string(),
                instance: field(2)?.to_string(),
                maintenance_port: parse_u16(field(3)?)?,
                metadata: if field(4)?.is_empty() { Value::Object(Default::default()) } else { parse_json(field(4)?)? },
            },
            Verb::Reconnect => Request::Reconnect { session_id: field(1)?.into() },
            Verb::Ping => Request::Ping { session_id: field(1)?.into() },
            Verb::SessionInfo => Request::SessionInfo { session_id: field(1)?.into() },
            Verb::ClientShutdown => Request::ClientShutdown { session_id: field(1)?.into() },
            Verb::RouteAdd => Request::RouteAdd {
                session_id: field(1)?.into(),
                domains_csv: field(2)?.to_string(),
                path: field(3)?.to_string(),
                backend_url: field(4)?.to_string(),
                priority: parse_i64(field(5)?)?,
            },
            Verb::RouteAddBulk => Request::RouteAddBulk { session_id: field(1)?.into(), routes_json: parse_json(field(2)?)? },
            Verb::RouteUpdate => Request::RouteUpdate {
                session_id: field(1)?.into(),
                route_id: field(2)?.into(),
                fields_json: parse_json(field(3)?)?,
            },
            Verb::RouteRemove => Request::RouteRemove { session_id: field(1)?.into(), route_id: field(2)?.into() },
            Verb::RouteList => Request::RouteList { session_id: field(1)?.into() },
            Verb::HeadersSet => Request::HeadersSet { session_id: field(1)?.into(), headers_json: parse_json(field(2)?)? },
            Verb::HeadersRemove => Request::HeadersRemove { session_id: field(1)?.into(), keys_csv: field(2)?.to_string() },
            Verb::OptionsSet => Request::OptionsSet { session_id: field(1)?.into(), options_json: parse_json(field(2)?)? },
            Verb::OptionsRemove => Request::OptionsRemove { session_id: field(1)?.into(), keys_csv: field(2)?.to_string() },
            Verb::HealthSet => Request::HealthSet {
                session_id: field(1)?.into(),
                route_id: field(2)?.into(),
                spec_json: parse_json(field(3)?)?,
            },
            Verb::RatelimitSet => Request::RatelimitSet {
                session_id: field(1)?.into(),
                route_id: field(2)?.into(),
                spec_json: parse_json(field(3)?)?,
            },
            Verb::CircuitBreakerSet => Request::CircuitBreakerSet {
                session_id: field(1)?.into(),
                route_id: field(2)?.into(),
                spec_json: parse_json(field(3)?)?,
            },
            Verb::CircuitBreakerStatus => {
                Request::CircuitBreakerStatus { session_id: field(1)?.into(), route_id: field(2)?.into() }
            }
            Verb::CircuitBreakerReset => {
                Request::CircuitBreakerReset { session_id: field(1)?.into(), route_id: field(2)?.into() }
            }
            Verb::ConfigValidate => Request::ConfigValidate { session_id: field(1)?.into() },
            Verb::ConfigApply => Request::ConfigApply { session_id: field(1)?.into() },
            Verb::ConfigRollback => Request::ConfigRollback { session_id: field(1)?.into() },
            Verb::ConfigDiff => Request::ConfigDiff { session_id: field(1)?.into() },
            Verb::ConfigApplyPartial => {
                Request::ConfigApplyPartial { session_id: field(1)?.into(), scopes_csv: field(2)?.to_string() }
            }
            Verb::DrainStart => Request::DrainStart { session_id: field(1)?.into(), duration_secs: parse_u64(field(2)?)? },
            Verb::DrainStatus => Request::DrainStatus { session_id: field(1)?.into() },
            Verb::DrainCancel => Request::DrainCancel { session_id: field(1)?.into() },
            Verb::MaintEnter => Request::MaintEnter {
                session_id: field(1)?.into(),
                targets_csv: field(2)?.to_string(),
                page_url: field(3).ok().filter(|s| !s.is_empty()).map(|s| s.to_string()),
            },
            Verb::MaintExit => Request::MaintExit { session_id: field(1)?.into(), targets_csv: field(2)?.to_string() },
            Verb::MaintStatus => Request::MaintStatus { session_id: field(1)?.into() },
            Verb::StatsGet => Request::StatsGet { session_id: field(1)?.into() },
            Verb::BackendTest => Request::BackendTest { session_id: field(1)?.into(), url: field(2)?.to_string() },
            Verb::Subscribe => Request::Subscribe { session_id: field(1)?.into(), event_types_csv: field(2)?.to_string() },
            Verb::Unsubscribe => Request::Unsubscribe { session_id: field(1)?.into() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_with_empty_metadata() {
        let req = Request::parse("REGISTER|svcA|inst1|3001|").unwrap();
        match req {
            Request::Register { service, instance, maintenance_port, metadata } => {
                assert_eq!(service, "svcA");
                assert_eq!(instance, "inst1");
                assert_eq!(maintenance_port, 3001);
                assert_eq!(metadata, Value::Object(Default::default()));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn parses_route_add_with_priority() {
        let req = Request::parse("ROUTE_ADD|s1|example.com|/api|http://127.0.0.1:8080|10").unwrap();
        match req {
            Request::RouteAdd { session_id, domains_csv, path, backend_url, priority } => {
                assert_eq!(session_id.as_str(), "s1");
                assert_eq!(domains_csv, "example.com");
                assert_eq!(path, "/api");
                assert_eq!(backend_url, "http://127.0.0.1:8080");
                assert_eq!(priority, 10);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert!(matches!(Request::parse("FROB|x"), Err(ProtocolError::UnknownVerb(_))));
    }

    #[test]
    fn route_add_bulk_json_retains_embedded_pipes() {
        let req = Request::parse(r#"ROUTE_ADD_BULK|s1|[{"note":"a|b"}]"#).unwrap();
        match req {
            Request::RouteAddBulk { routes_json, .. } => {
                assert_eq!(routes_json[0]["note"], "a|b");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn maint_enter_without_page_url_is_none() {
        let req = Request::parse("MAINT_ENTER|s1|r1").unwrap();
        match req {
            Request::MaintEnter { page_url, .. } => assert!(page_url.is_none()),
            _ => panic!("wrong variant"),
        }
    }
}
