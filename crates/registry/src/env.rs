//! Centralized environment variable access for the registry binary.

use std::time::Duration;

/// TCP port the registry's client protocol listens on.
pub fn listen_port() -> u16 {
    std::env::var("RRCP_LISTEN_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(81)
}

/// Port the internal route-index snapshot endpoint binds on, polled by
/// `dataplaned`.
pub fn route_index_port() -> u16 {
    std::env::var("RRCP_ROUTE_INDEX_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8790)
}

/// Per-command handler deadline.
pub fn command_timeout() -> Duration {
    std::env::var("RRCP_COMMAND_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// `BACKEND_TEST`'s outbound request timeout.
pub fn backend_test_timeout() -> Duration {
    std::env::var("RRCP_BACKEND_TEST_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(3))
}

/// How long an abandoned staged view survives before the sweeper resets it
/// to match active.
pub fn staging_ttl() -> Duration {
    std::env::var("RRCP_STAGING_TTL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30 * 60))
}

/// How long a disconnected session stays reconnectable before retirement.
pub fn reconnect_grace() -> Duration {
    std::env::var("RRCP_RECONNECT_GRACE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(5 * 60))
}

/// Interval of the periodic sweeper (stale-staging GC, disconnected-session
/// retirement, breaker recompute, drain-completion checks).
pub fn sweep_interval() -> Duration {
    std::env::var("RRCP_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(5 * 60))
}

/// TCP keepalive period for accepted client connections.
pub fn tcp_keepalive() -> Duration {
    std::env::var("RRCP_TCP_KEEPALIVE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30))
}

/// Threshold of repeated protocol errors on one connection before it is
/// closed (the session survives for reconnection).
pub fn protocol_error_threshold() -> u32 {
    std::env::var("RRCP_PROTOCOL_ERROR_THRESHOLD").ok().and_then(|s| s.parse().ok()).unwrap_or(10)
}

pub fn log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "registryd=info,rrcp_registry=info,rrcp_core=info".to_string())
}
