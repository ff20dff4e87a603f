//! `ROUTE_ADD`, `ROUTE_ADD_BULK`, `ROUTE_UPDATE`, `ROUTE_REMOVE`,
//! `ROUTE_LIST`.

use rrcp_core::{CoreError, HostPattern, Route, Session};
use rrcp_wire::Response;
use serde_json::Value;
use std::time::Instant;

fn parse_hosts(domains_csv: &str) -> Result<Vec<HostPattern>, CoreError> {
    let mut hosts = Vec::new();
    for raw in domains_csv.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match HostPattern::parse(raw) {
            Some(h) => hosts.push(h),
            None => return Err(CoreError::BadArguments(format!("invalid host pattern: {raw:?}"))),
        }
    }
    if hosts.is_empty() {
        return Err(CoreError::BadArguments("no host patterns given".to_string()));
    }
    Ok(hosts)
}

pub fn add(session: &Session, domains_csv: &str, path: &str, backend_url: &str, priority: i64, now: Instant) -> Result<Response, CoreError> {
    let hosts = parse_hosts(domains_csv)?;
    let id = session.next_route_id();
    let route = Route {
        id: id.clone(),
        hosts,
        path: path.to_string(),
        backend_url: backend_url.to_string(),
        priority,
        response_headers: Default::default(),
        options: Default::default(),
        health: None,
        rate_limit: None,
        circuit_breaker: None,
    };
    route.validate_self().map_err(CoreError::ValidationFailed)?;
    session.stage_add_route(route, now);
    Ok(Response::RouteOk { route_id: id.to_string() })
}

/// `ROUTE_ADD_BULK`: each element is `{domains, path, backend_url, priority}`.
/// All-or-nothing: if any entry is malformed, nothing is staged.
pub fn add_bulk(session: &Session, routes_json: &Value, now: Instant) -> Result<Response, CoreError> {
    let entries = routes_json.as_array().ok_or_else(|| CoreError::BadArguments("expected a JSON array".to_string()))?;

    let mut parsed = Vec::with_capacity(entries.len());
    for entry in entries {
        let domains_csv = entry.get("domains").and_then(Value::as_str).ok_or_else(|| CoreError::BadArguments("missing domains".to_string()))?;
        let path = entry.get("path").and_then(Value::as_str).ok_or_else(|| CoreError::BadArguments("missing path".to_string()))?;
        let backend_url = entry
            .get("backend_url")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::BadArguments("missing backend_url".to_string()))?;
        let priority = entry.get("priority").and_then(Value::as_i64).unwrap_or(0);
        let hosts = parse_hosts(domains_csv)?;
        let route = Route {
            id: "".into(),
            hosts,
            path: path.to_string(),
            backend_url: backend_url.to_string(),
            priority,
            response_headers: Default::default(),
            options: Default::default(),
            health: None,
            rate_limit: None,
            circuit_breaker: None,
        };
        route.validate_self().map_err(CoreError::ValidationFailed)?;
        parsed.push(route);
    }

    let mut route_ids = Vec::with_capacity(parsed.len());
    for mut route in parsed {
        let id = session.next_route_id();
        route.id = id.clone();
        session.stage_add_route(route, now);
        route_ids.push(id.to_string());
    }
    Ok(Response::RouteOkBulk { route_ids })
}

pub fn update(session: &Session, route_id: &str, fields_json: &Value, now: Instant) -> Result<Response, CoreError> {
    let route_id = route_id.into();
    let existing = session
        .staged_view()
        .routes
        .get(&route_id)
        .cloned()
        .ok_or_else(|| CoreError::RouteNotFound(route_id.to_string()))?;
    let mut updated = existing;
    merge_fields(&mut updated, fields_json)?;
    updated.validate_self().map_err(CoreError::ValidationFailed)?;
    session.stage_update_route(&route_id, updated, now)?;
    Ok(Response::RouteUpdateOk)
}

fn merge_fields(route: &mut Route, fields: &Value) -> Result<(), CoreError> {
    let obj = fields.as_object().ok_or_else(|| CoreError::BadArguments("expected a JSON object".to_string()))?;
    if let Some(domains) = obj.get("domains").and_then(Value::as_str) {
        route.hosts = parse_hosts(domains)?;
    }
    if let Some(path) = obj.get("path").and_then(Value::as_str) {
        route.path = path.to_string();
    }
    if let Some(backend_url) = obj.get("backend_url").and_then(Value::as_str) {
        route.backend_url = backend_url.to_string();
    }
    if let Some(priority) = obj.get("priority").and_then(Value::as_i64) {
        route.priority = priority;
    }
    Ok(())
}

pub fn remove(session: &Session, route_id: &str, now: Instant) -> Result<Response, CoreError> {
    session.stage_remove_route(&route_id.into(), now)?;
    Ok(Response::RouteRemoveOk)
}

pub fn list(session: &Session) -> Response {
    let routes: Vec<Route> = session.active_routes().into_values().collect();
    Response::RouteListOk { routes: serde_json::to_value(routes).unwrap_or(Value::Array(Vec::new())) }
}
