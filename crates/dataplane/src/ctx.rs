//! Shared dataplane context: the polled route-index snapshot plus the
//! dataplane-local state (rate limiters, circuit breakers, maintenance page
//! cache) the registry has no visibility into.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rrcp_core::RouteIndex;

use crate::circuit::CircuitBreakers;
use crate::maintenance_page::MaintenancePageCache;
use crate::ratelimit::RateLimiter;

pub struct DataplaneCtx {
    pub index: ArcSwap<RouteIndex>,
    pub http_client: reqwest::Client,
    pub rate_limiter: RateLimiter,
    pub circuit_breakers: CircuitBreakers,
    pub maintenance_pages: MaintenancePageCache,
}

impl DataplaneCtx {
    pub fn new(http_client: reqwest::Client) -> Arc<Self> {
        Arc::new(Self {
            index: ArcSwap::from_pointee(RouteIndex::default()),
            http_client,
            rate_limiter: RateLimiter::new(),
            circuit_breakers: CircuitBreakers::new(),
            maintenance_pages: MaintenancePageCache::new(),
        })
    }
}
