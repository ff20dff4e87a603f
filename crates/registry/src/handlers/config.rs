//! `HEADERS_*`, `OPTIONS_*`, `HEALTH_SET`, `RATELIMIT_SET`,
//! `CIRCUIT_BREAKER_SET`, and the `CONFIG_*` staging lifecycle verbs.

use std::collections::HashMap;
use std::time::Instant;

use rrcp_core::{CircuitBreakerSpec, CoreError, HealthSpec, RateLimitSpec, Session};
use rrcp_wire::Response;
use serde_json::Value;

fn json_to_string_map(value: &Value) -> Result<HashMap<String, String>, CoreError> {
    let obj = value.as_object().ok_or_else(|| CoreError::BadArguments("expected a JSON object".to_string()))?;
    obj.iter()
        .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())).ok_or_else(|| CoreError::BadArguments(format!("{k} is not a string"))))
        .collect()
}

fn csv_keys(csv: &str) -> Vec<String> {
    csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

pub fn headers_set(session: &Session, headers_json: &Value, now: Instant) -> Result<Response, CoreError> {
    session.stage_headers_set(json_to_string_map(headers_json)?, now);
    Ok(Response::HeadersSetOk)
}

pub fn headers_remove(session: &Session, keys_csv: &str, now: Instant) -> Response {
    session.stage_headers_remove(&csv_keys(keys_csv), now);
    Response::HeadersRemoveOk
}

pub fn options_set(session: &Session, options_json: &Value, now: Instant) -> Result<Response, CoreError> {
    session.stage_options_set(json_to_string_map(options_json)?, now);
    Ok(Response::OptionsSetOk)
}

pub fn options_remove(session: &Session, keys_csv: &str, now: Instant) -> Response {
    session.stage_options_remove(&csv_keys(keys_csv), now);
    Response::OptionsRemoveOk
}

pub fn health_set(session: &Session, route_id: &str, spec_json: &Value, now: Instant) -> Result<Response, CoreError> {
    let spec: HealthSpec = serde_json::from_value(spec_json.clone()).map_err(|e| CoreError::BadArguments(e.to_string()))?;
    session.stage_mutate_route(&route_id.into(), now, |route| route.health = Some(spec))?;
    Ok(Response::HealthSetOk)
}

pub fn ratelimit_set(session: &Session, route_id: &str, spec_json: &Value, now: Instant) -> Result<Response, CoreError> {
    let spec: RateLimitSpec = serde_json::from_value(spec_json.clone()).map_err(|e| CoreError::BadArguments(e.to_string()))?;
    session.stage_mutate_route(&route_id.into(), now, |route| route.rate_limit = Some(spec))?;
    Ok(Response::RatelimitSetOk)
}

pub fn circuit_breaker_set(session: &Session, route_id: &str, spec_json: &Value, now: Instant) -> Result<Response, CoreError> {
    let spec: CircuitBreakerSpec = serde_json::from_value(spec_json.clone()).map_err(|e| CoreError::BadArguments(e.to_string()))?;
    let route_id = route_id.into();
    session.stage_mutate_route(&route_id, now, |route| route.circuit_breaker = Some(spec.clone()))?;
    session.circuit_breaker_set(&route_id, spec);
    Ok(Response::CircuitBreakerSetOk)
}

pub fn validate(session: &Session) -> Result<Response, CoreError> {
    session.validate_staged()?;
    Ok(Response::ConfigValidateOk)
}

pub fn apply(session: &Session, now: Instant) -> Result<Response, CoreError> {
    session.apply(now)?;
    Ok(Response::ConfigApplyOk)
}

pub fn rollback(session: &Session, now: Instant) -> Response {
    session.rollback(now);
    Response::ConfigRollbackOk
}

pub fn diff(session: &Session) -> Response {
    Response::ConfigDiffOk { diff: serde_json::to_value(session.diff()).unwrap_or(Value::Null) }
}

pub fn apply_partial(session: &Session, scopes_csv: &str, now: Instant) -> Result<Response, CoreError> {
    let scopes: Vec<_> = scopes_csv
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| rrcp_core::ApplyScope::parse(s).ok_or_else(|| CoreError::BadArguments(format!("unknown scope: {s:?}"))))
        .collect::<Result<_, _>>()?;
    if scopes.is_empty() {
        return Err(CoreError::BadArguments("no scopes given".to_string()));
    }
    session.apply_partial(&scopes, now)?;
    Ok(Response::ConfigApplyPartialOk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrcp_core::SessionId;

    fn session() -> Session {
        Session::new(SessionId::from("s1"), "svc".into(), "i1".into(), 3000, serde_json::json!({}), Instant::now())
    }

    #[test]
    fn headers_set_then_remove_round_trips() {
        let session = session();
        let now = Instant::now();
        headers_set(&session, &serde_json::json!({"X-A": "1"}), now).unwrap();
        assert_eq!(session.staged_view().headers.get("X-A"), Some(&"1".to_string()));
        headers_remove(&session, "X-A", now);
        assert!(session.staged_view().headers.get("X-A").is_none());
    }

    #[test]
    fn apply_partial_rejects_unknown_scope() {
        let session = session();
        let err = apply_partial(&session, "bogus", Instant::now()).unwrap_err();
        assert!(matches!(err, CoreError::BadArguments(_)));
    }

    #[test]
    fn circuit_breaker_set_attaches_spec_and_arms_breaker() {
        let session = session();
        let now = Instant::now();
        super::routes::add(&session, "a.com", "/api", "http://127.0.0.1:1", 1, now).unwrap();
        let route_id = session.staged_view().routes.keys().next().unwrap().clone();
        circuit_breaker_set(
            &session,
            route_id.as_str(),
            &serde_json::json!({"failure_threshold": 3, "open_timeout_secs": 10}),
            now,
        )
        .unwrap();
        assert!(session.circuit_should_admit(&route_id, now));
    }
}
