//! Reverse-proxy forward: rewrite the request for the backend, forward
//! method/headers/body, apply per-session response-header overrides, and
//! report the result back through the circuit breaker.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use rrcp_core::Route;
use thiserror::Error;

/// Headers that are connection-scoped and must never be forwarded, per
/// RFC 7230 §6.1 plus the de-facto `Proxy-Connection`/`Keep-Alive` pair
/// still sent by older clients.
const HOP_BY_HOP: &[&str] =
    &["connection", "proxy-connection", "keep-alive", "proxy-authenticate", "proxy-authorization", "te", "trailer", "transfer-encoding", "upgrade"];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

pub struct ProxyOutcome {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("malformed backend url")]
    MalformedBackendUrl,
    #[error("{0}")]
    Request(String),
}

/// Forward one request to `route`'s backend. `request_path` is the
/// original request's path+query; the route's path prefix is preserved on
/// the backend URL (no path rewriting beyond the host swap).
pub async fn forward(
    client: &reqwest::Client,
    route: &Route,
    method: &Method,
    request_path_and_query: &str,
    mut headers: HeaderMap,
    body: Bytes,
    client_addr: Option<std::net::IpAddr>,
    read_timeout: Duration,
) -> Result<ProxyOutcome, ProxyError> {
    strip_hop_by_hop(&mut headers);
    set_forwarded_headers(&mut headers, &headers_host(&headers), client_addr);

    let backend_authority = backend_authority(&route.backend_url).ok_or_else(|| ProxyError::MalformedBackendUrl)?;
    headers.insert(axum::http::header::HOST, HeaderValue::from_str(&backend_authority).map_err(|e| ProxyError::Request(e.to_string()))?);

    let url = format!("{}{}", route.backend_url.trim_end_matches('/'), request_path_and_query);
    let reqwest_method = reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|e| ProxyError::Request(e.to_string()))?;

    let mut builder = client.request(reqwest_method, &url).timeout(read_timeout).body(body.to_vec());
    for (name, value) in headers.iter() {
        if let Ok(reqwest_name) = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()) {
            if let Ok(reqwest_value) = reqwest::header::HeaderValue::from_bytes(value.as_bytes()) {
                builder = builder.header(reqwest_name, reqwest_value);
            }
        }
    }

    let resp = builder.send().await.map_err(|e| ProxyError::Request(e.to_string()))?;
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response_headers = HeaderMap::new();
    for (name, value) in resp.headers().iter() {
        if let (Ok(n), Ok(v)) = (HeaderName::from_bytes(name.as_str().as_bytes()), HeaderValue::from_bytes(value.as_bytes())) {
            response_headers.append(n, v);
        }
    }
    strip_hop_by_hop(&mut response_headers);

    for (key, value) in &route.response_headers {
        if let (Ok(n), Ok(v)) = (HeaderName::from_bytes(key.as_bytes()), HeaderValue::from_str(value)) {
            response_headers.insert(n, v);
        }
    }

    let body = resp.bytes().await.map_err(|e| ProxyError::Request(e.to_string()))?;
    Ok(ProxyOutcome { status, headers: response_headers, body })
}

fn headers_host(headers: &HeaderMap) -> String {
    headers.get(axum::http::header::HOST).and_then(|v| v.to_str().ok()).unwrap_or("").to_string()
}

/// Set/append `X-Forwarded-For`, `X-Forwarded-Host`, `X-Forwarded-Proto`.
/// `X-Forwarded-For` appends to any existing chain rather than replacing
/// it, since a request may already have passed through another proxy.
fn set_forwarded_headers(headers: &mut HeaderMap, original_host: &str, client_addr: Option<std::net::IpAddr>) {
    if !original_host.is_empty() {
        if let Ok(v) = HeaderValue::from_str(original_host) {
            headers.insert(HeaderName::from_static("x-forwarded-host"), v);
        }
    }
    headers.insert(HeaderName::from_static("x-forwarded-proto"), HeaderValue::from_static("http"));

    if let Some(addr) = client_addr {
        let existing = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()).map(str::to_string);
        let chain = match existing {
            Some(prior) => format!("{prior}, {addr}"),
            None => addr.to_string(),
        };
        if let Ok(v) = HeaderValue::from_str(&chain) {
            headers.insert(HeaderName::from_static("x-forwarded-for"), v);
        }
    }
}

/// The backend URL's host[:port], for the rewritten `Host` header.
fn backend_authority(backend_url: &str) -> Option<String> {
    let rest = backend_url.split_once("://")?.1;
    let authority = rest.split(['/', '?', '#']).next()?;
    if authority.is_empty() {
        return None;
    }
    Some(authority.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(HeaderName::from_static("transfer-encoding"), HeaderValue::from_static("chunked"));
        headers.insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        strip_hop_by_hop(&mut headers);
        assert!(headers.get(axum::http::header::CONNECTION).is_none());
        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get(axum::http::header::CONTENT_TYPE).is_some());
    }

    #[test]
    fn forwarded_for_appends_to_existing_chain() {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-forwarded-for"), HeaderValue::from_static("10.0.0.1"));
        set_forwarded_headers(&mut headers, "example.com", Some("10.0.0.2".parse().unwrap()));
        assert_eq!(headers.get("x-forwarded-for").unwrap().to_str().unwrap(), "10.0.0.1, 10.0.0.2");
        assert_eq!(headers.get("x-forwarded-host").unwrap().to_str().unwrap(), "example.com");
    }

    #[test]
    fn backend_authority_extracts_host_and_port() {
        assert_eq!(backend_authority("http://127.0.0.1:8080/x").as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(backend_authority("https://api.example.com").as_deref(), Some("api.example.com"));
        assert_eq!(backend_authority("not-a-url"), None);
    }
}
