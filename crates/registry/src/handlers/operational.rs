//! `PING`, `SESSION_INFO`, `CLIENT_SHUTDOWN`, `DRAIN_*`, `MAINT_*`,
//! `CIRCUIT_BREAKER_STATUS`/`CIRCUIT_BREAKER_RESET`, `STATS_GET`,
//! `BACKEND_TEST`.

use std::time::{Duration, Instant};

use rrcp_core::{CoreError, RouteId, Session};
use rrcp_wire::Response;

pub fn ping() -> Response {
    Response::Pong
}

pub fn session_info(session: &Session) -> Response {
    let info = serde_json::json!({
        "session_id": session.id.as_str(),
        "service": session.service,
        "instance": session.instance,
        "maintenance_port": session.maintenance_port,
        "metadata": session.metadata,
        "connection_state": format!("{:?}", session.connection_state()),
        "active_routes": session.active_routes().len(),
    });
    Response::SessionInfoOk { info }
}

pub fn client_shutdown() -> Response {
    Response::ClientShutdownOk
}

pub fn drain_start(session: &Session, duration_secs: u64, now: Instant) -> Response {
    session.drain_start(now, Duration::from_secs(duration_secs));
    Response::DrainStartOk
}

pub fn drain_status(session: &Session, now: Instant) -> Response {
    let status = session.drain_status(now);
    Response::DrainStatusOk { status: serde_json::to_value(status).unwrap_or(serde_json::Value::Null) }
}

pub fn drain_cancel(session: &Session) -> Response {
    session.drain_cancel();
    Response::DrainCancelOk
}

fn parse_targets(csv: &str) -> Vec<RouteId> {
    csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(RouteId::from).collect()
}

pub fn maint_enter(session: &Session, targets_csv: &str, page_url: Option<String>) -> Response {
    let targets = parse_targets(targets_csv);
    session.maintenance_enter(&targets, page_url);
    Response::MaintOk { target: targets_csv.to_string() }
}

pub fn maint_exit(session: &Session, targets_csv: &str) -> Response {
    session.maintenance_exit(&parse_targets(targets_csv));
    Response::MaintExitOk
}

pub fn maint_status(session: &Session) -> Response {
    let set = session.maintenance_snapshot();
    Response::MaintStatusOk { status: serde_json::to_value(set).unwrap_or(serde_json::Value::Null) }
}

pub fn circuit_breaker_status(session: &Session, route_id: &str) -> Result<Response, CoreError> {
    let route_id: RouteId = route_id.into();
    let state = session.circuit_state(&route_id).ok_or_else(|| CoreError::RouteNotFound(route_id.to_string()))?;
    Ok(Response::CircuitBreakerStatusOk { state: serde_json::json!({ "state": format!("{state:?}") }) })
}

pub fn circuit_breaker_reset(session: &Session, route_id: &str) -> Result<Response, CoreError> {
    session.circuit_breaker_reset(&route_id.into())?;
    Ok(Response::CircuitBreakerResetOk)
}

pub fn stats_get(session: &Session) -> Response {
    Response::StatsGetOk { stats: serde_json::to_value(session.stats_snapshot()).unwrap_or(serde_json::Value::Array(Vec::new())) }
}

/// `BACKEND_TEST`: probe a candidate backend URL with a bounded-timeout
/// `GET`, reporting reachability without mutating any session state.
pub async fn backend_test(client: &reqwest::Client, url: &str, timeout: Duration) -> Response {
    let result = tokio::time::timeout(timeout, client.get(url).send()).await;
    let payload = match result {
        Ok(Ok(resp)) => serde_json::json!({ "reachable": true, "status": resp.status().as_u16() }),
        Ok(Err(e)) => serde_json::json!({ "reachable": false, "error": e.to_string() }),
        Err(_) => serde_json::json!({ "reachable": false, "error": "timeout" }),
    };
    Response::BackendTestOk { result: payload }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrcp_core::SessionId;

    fn session() -> Session {
        Session::new(SessionId::from("s1"), "svc".into(), "i1".into(), 3000, serde_json::json!({}), Instant::now())
    }

    #[test]
    fn maint_enter_then_exit_round_trips() {
        let session = session();
        maint_enter(&session, "r1,r2", None);
        let snap = session.maintenance_snapshot();
        assert!(snap.route_ids.contains(&RouteId::from("r1")));
        maint_exit(&session, "r1,r2");
        assert!(session.maintenance_snapshot().is_empty());
    }

    #[test]
    fn circuit_breaker_status_unknown_route_errors() {
        let session = session();
        let err = circuit_breaker_status(&session, "r404").unwrap_err();
        assert!(matches!(err, CoreError::RouteNotFound(_)));
    }

    #[tokio::test]
    async fn backend_test_times_out_against_a_dead_address() {
        let client = reqwest::Client::new();
        let resp = backend_test(&client, "http://127.0.0.1:1", Duration::from_millis(50)).await;
        match resp {
            Response::BackendTestOk { result } => assert_eq!(result["reachable"], false),
            _ => panic!("wrong variant"),
        }
    }
}
