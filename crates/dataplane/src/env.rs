//! Centralized environment variable access for the dataplane binary.

use std::time::Duration;

/// TCP port the HTTP dataplane listens on.
pub fn listen_port() -> u16 {
    std::env::var("RRCP_DATAPLANE_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080)
}

/// Base URL of the registry's internal route-index snapshot endpoint, e.g.
/// `http://127.0.0.1:8790`.
pub fn registry_index_url() -> String {
    std::env::var("RRCP_REGISTRY_INDEX_URL").unwrap_or_else(|_| "http://127.0.0.1:8790".to_string())
}

/// How often the snapshot poller fetches a fresh route index.
pub fn index_poll_interval() -> Duration {
    std::env::var("RRCP_INDEX_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(500))
}

/// Read timeout for a proxied backend request.
pub fn proxy_read_timeout() -> Duration {
    std::env::var("RRCP_PROXY_READ_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30))
}

/// How long a fetched maintenance page is cached before being re-fetched.
pub fn maintenance_page_ttl() -> Duration {
    std::env::var("RRCP_MAINTENANCE_PAGE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60))
}

/// Timeout for a maintenance-page fetch.
pub fn maintenance_page_fetch_timeout() -> Duration {
    std::env::var("RRCP_MAINTENANCE_PAGE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(3))
}

pub fn log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "dataplaned=info,rrcp_dataplane=info,rrcp_core=info".to_string())
}
