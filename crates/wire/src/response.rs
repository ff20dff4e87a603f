use rrcp_core::{ErrorKind, SessionId};
use serde_json::Value;

/// A response frame. Success frames render as `<VERB>_OK[|<data>]`; errors
/// render as `ERROR|<kind>|<message>`.
#[derive(Debug, Clone)]
pub enum Response {
    Ack { session_id: SessionId },
    Ok,
    Pong,
    RouteOk { route_id: String },
    RouteOkBulk { route_ids: Vec<String> },
    RouteListOk { routes: Value },
    RouteUpdateOk,
    RouteRemoveOk,
    HeadersSetOk,
    HeadersRemoveOk,
    OptionsSetOk,
    OptionsRemoveOk,
    HealthSetOk,
    RatelimitSetOk,
    CircuitBreakerSetOk,
    CircuitBreakerStatusOk { state: Value },
    CircuitBreakerResetOk,
    ConfigValidateOk,
    ConfigApplyOk,
    ConfigRollbackOk,
    ConfigDiffOk { diff: Value },
    ConfigApplyPartialOk,
    DrainStartOk,
    DrainStatusOk { status: Value },
    DrainCancelOk,
    MaintOk { target: String },
    MaintExitOk,
    MaintStatusOk { status: Value },
    StatsGetOk { stats: Value },
    BackendTestOk { result: Value },
    SessionInfoOk { info: Value },
    ClientShutdownOk,
    SubscribeOk,
    UnsubscribeOk,
    Event { kind: String, payload: Value },
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, message: message.into() }
    }

    pub fn to_frame(&self) -> String {
        match self {
            Response::Ack { session_id } => format!("ACK|{session_id}"),
            Response::Ok => "OK".to_string(),
            Response::Pong => "PONG".to_string(),
            Response::RouteOk { route_id } => format!("ROUTE_OK|{route_id}"),
            Response::RouteOkBulk { route_ids } => {
                format!("ROUTE_OK|{}", serde_json::to_string(route_ids).unwrap_or_default())
            }
            Response::RouteListOk { routes } => format!("ROUTE_LIST_OK|{}", routes_to_json(routes)),
            Response::RouteUpdateOk => "ROUTE_UPDATE_OK".to_string(),
            Response::RouteRemoveOk => "ROUTE_REMOVE_OK".to_string(),
            Response::HeadersSetOk => "HEADERS_SET_OK".to_string(),
            Response::HeadersRemoveOk => "HEADERS_REMOVE_OK".to_string(),
            Response::OptionsSetOk => "OPTIONS_SET_OK".to_string(),
            Response::OptionsRemoveOk => "OPTIONS_REMOVE_OK".to_string(),
            Response::HealthSetOk => "HEALTH_SET_OK".to_string(),
            Response::RatelimitSetOk => "RATELIMIT_SET_OK".to_string(),
            Response::CircuitBreakerSetOk => "CIRCUIT_BREAKER_SET_OK".to_string(),
            Response::CircuitBreakerStatusOk { state } => format!("CIRCUIT_BREAKER_STATUS_OK|{}", routes_to_json(state)),
            Response::CircuitBreakerResetOk => "CIRCUIT_BREAKER_RESET_OK".to_string(),
            Response::ConfigValidateOk => "CONFIG_VALIDATE_OK".to_string(),
            Response::ConfigApplyOk => "CONFIG_APPLY_OK".to_string(),
            Response::ConfigRollbackOk => "CONFIG_ROLLBACK_OK".to_string(),
            Response::ConfigDiffOk { diff } => format!("CONFIG_DIFF_OK|{}", routes_to_json(diff)),
            Response::ConfigApplyPartialOk => "CONFIG_APPLY_PARTIAL_OK".to_string(),
            Response::DrainStartOk => "DRAIN_START_OK".to_string(),
            Response::DrainStatusOk { status } => format!("DRAIN_STATUS_OK|{}", routes_to_json(status)),
            Response::DrainCancelOk => "DRAIN_CANCEL_OK".to_string(),
            Response::MaintOk { target } => format!("MAINT_OK|{target}"),
            Response::MaintExitOk => "MAINT_EXIT_OK".to_string(),
            Response::MaintStatusOk { status } => format!("MAINT_STATUS_OK|{}", routes_to_json(status)),
            Response::StatsGetOk { stats } => format!("STATS_GET_OK|{}", routes_to_json(stats)),
            Response::BackendTestOk { result } => format!("BACKEND_TEST_OK|{}", routes_to_json(result)),
            Response::SessionInfoOk { info } => format!("SESSION_INFO_OK|{}", routes_to_json(info)),
            Response::ClientShutdownOk => "CLIENT_SHUTDOWN_OK".to_string(),
            Response::SubscribeOk => "SUBSCRIBE_OK".to_string(),
            Response::UnsubscribeOk => "UNSUBSCRIBE_OK".to_string(),
            Response::Event { kind, payload } => format!("EVENT|{kind}|{}", routes_to_json(payload)),
            Response::Error { kind, message } => format!("ERROR|{kind}|{message}"),
        }
    }
}

fn routes_to_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_frames_the_session_id() {
        let resp = Response::Ack { session_id: "svcA-1-abc".into() };
        assert_eq!(resp.to_frame(), "ACK|svcA-1-abc");
    }

    #[test]
    fn error_frame_has_three_pipe_delimited_fields() {
        let resp = Response::error(ErrorKind::ValidationFailed, "duplicate_route: r1 and r2");
        assert_eq!(resp.to_frame(), "ERROR|validation_failed|duplicate_route: r1 and r2");
    }

    #[test]
    fn route_ok_bulk_serializes_as_json_array() {
        let resp = Response::RouteOkBulk { route_ids: vec!["r1".into(), "r2".into()] };
        assert_eq!(resp.to_frame(), "ROUTE_OK|[\"r1\",\"r2\"]");
    }

    #[test]
    fn event_frame_carries_kind_and_payload() {
        let resp = Response::Event { kind: "route_added".into(), payload: serde_json::json!({"route_id": "r1"}) };
        assert_eq!(resp.to_frame(), "EVENT|route_added|{\"route_id\":\"r1\"}");
    }
}
