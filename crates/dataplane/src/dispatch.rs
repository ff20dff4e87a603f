//! The dispatch decision: resolve a route, then walk the ordered set of
//! admission checks (drain completed, maintenance, circuit breaker, rate
//! limit, drain admission draw) before proxying.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use tracing::warn;

use crate::ctx::DataplaneCtx;
use crate::{jitter, matcher, proxy};

const NOT_FOUND_BODY: &str = r#"{"error":"no route matched","status":404}"#;
const RATE_LIMITED_BODY: &str = r#"{"error":"rate limit exceeded","status":429}"#;
const DRAIN_COMPLETED_BODY: &str = r#"{"error":"service is draining","status":503}"#;
const DRAIN_REJECTED_BODY: &str = r#"{"error":"service is draining","status":503}"#;
const CIRCUIT_OPEN_BODY: &str = r#"{"error":"backend unavailable","status":503}"#;
const BAD_GATEWAY_BODY: &str = r#"{"error":"upstream error","status":502}"#;

pub async fn handle(State(ctx): State<Arc<DataplaneCtx>>, ConnectInfo(addr): ConnectInfo<SocketAddr>, req: Request) -> Response {
    let host = req
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|h| h.split(':').next().unwrap_or(h).to_string())
        .unwrap_or_default();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let headers = req.headers().clone();

    let index = ctx.index.load();
    let Some(entry) = matcher::resolve(&index, &host, &uri) else {
        return json_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY, &[]);
    };
    drop(index);

    if entry.drain_completed {
        return json_response(StatusCode::SERVICE_UNAVAILABLE, DRAIN_COMPLETED_BODY, &[("retry-after", "5")]);
    }

    if entry.in_maintenance {
        let (body, content_type) = ctx
            .maintenance_pages
            .get(
                &ctx.http_client,
                entry.maintenance_page_url.as_deref(),
                crate::env::maintenance_page_ttl(),
                crate::env::maintenance_page_fetch_timeout(),
                std::time::Instant::now(),
            )
            .await;
        return json_response_with_type(StatusCode::SERVICE_UNAVAILABLE, &body, &content_type, &[]);
    }

    let now = std::time::Instant::now();
    let route = &entry.route;

    if !ctx.circuit_breakers.should_admit(&route.id, route.circuit_breaker.as_ref(), now) {
        return json_response(StatusCode::SERVICE_UNAVAILABLE, CIRCUIT_OPEN_BODY, &[]);
    }

    if let Some(spec) = &route.rate_limit {
        if !ctx.rate_limiter.admit(&route.id, spec, now) {
            return json_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_BODY, &[("retry-after", "1")]);
        }
    }

    if entry.drain_admission_probability < 1.0 && jitter::unit_interval() >= entry.drain_admission_probability {
        return json_response(StatusCode::SERVICE_UNAVAILABLE, DRAIN_REJECTED_BODY, &[("retry-after", "1")]);
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            Bytes::new()
        }
    };

    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or(uri.path()).to_string();

    match proxy::forward(&ctx.http_client, route, &method, &path_and_query, headers, body, Some(addr.ip()), crate::env::proxy_read_timeout()).await {
        Ok(outcome) => {
            let success = outcome.status.as_u16() < 500;
            ctx.circuit_breakers.record_result(&route.id, route.circuit_breaker.as_ref(), now, success);
            let mut response = axum::response::Response::builder().status(outcome.status);
            for (name, value) in outcome.headers.iter() {
                response = response.header(name, value);
            }
            response.body(Body::from(outcome.body)).unwrap_or_else(|_| json_response(StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY, &[]))
        }
        Err(e) => {
            warn!(error = %e, route_id = %route.id, "backend dispatch failed");
            ctx.circuit_breakers.record_result(&route.id, route.circuit_breaker.as_ref(), now, false);
            json_response(StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY, &[])
        }
    }
}

fn json_response(status: StatusCode, body: &str, extra_headers: &[(&str, &str)]) -> Response {
    json_response_with_type(status, body, "application/json", extra_headers)
}

fn json_response_with_type(status: StatusCode, body: &str, content_type: &str, extra_headers: &[(&str, &str)]) -> Response {
    let mut response = (status, body.to_string()).into_response();
    if let Ok(v) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(axum::http::header::CONTENT_TYPE, v);
    }
    for (name, value) in extra_headers {
        if let (Ok(n), Ok(v)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            response.headers_mut().insert(n, v);
        }
    }
    response
}
