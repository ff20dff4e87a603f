//! Per-route token bucket, keyed by route ID.
//!
//! The registry only ships the configured `requests_per_second`/`burst`
//! pair in the route snapshot; the bucket itself is dataplane-local state
//! since it tracks a live request rate the registry never observes.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use rrcp_core::{RateLimitSpec, RouteId};

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(spec: &RateLimitSpec, now: Instant) -> Self {
        Self { tokens: spec.burst as f64, capacity: spec.burst as f64, refill_per_sec: spec.requests_per_second, last_refill: now }
    }

    fn refresh_spec(&mut self, spec: &RateLimitSpec) {
        self.capacity = spec.burst as f64;
        self.refill_per_sec = spec.requests_per_second;
        self.tokens = self.tokens.min(self.capacity);
    }

    fn try_admit(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token buckets for every route currently carrying a rate-limit spec.
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<RouteId, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit (or reject) one request against `route_id`'s bucket, creating
    /// it on first use and re-seeding its rate if `spec` changed since.
    pub fn admit(&self, route_id: &RouteId, spec: &RateLimitSpec, now: Instant) -> bool {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(route_id.clone()).or_insert_with(|| Bucket::new(spec, now));
        bucket.refresh_spec(spec);
        bucket.try_admit(now)
    }

    /// Drop buckets for routes no longer present in the published index,
    /// so a long-lived dataplane doesn't accumulate stale entries.
    pub fn retain_known(&self, known: &std::collections::HashSet<RouteId>) {
        self.buckets.lock().retain(|id, _| known.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(rps: f64, burst: u32) -> RateLimitSpec {
        RateLimitSpec { requests_per_second: rps, burst }
    }

    #[test]
    fn burst_capacity_is_exhausted_then_refills_over_time() {
        let limiter = RateLimiter::new();
        let id = RouteId::from("r1");
        let t0 = Instant::now();
        let s = spec(10.0, 2);
        assert!(limiter.admit(&id, &s, t0));
        assert!(limiter.admit(&id, &s, t0));
        assert!(!limiter.admit(&id, &s, t0));

        let later = t0 + std::time::Duration::from_millis(150);
        assert!(limiter.admit(&id, &s, later));
    }

    #[test]
    fn retain_known_drops_stale_buckets() {
        let limiter = RateLimiter::new();
        let id = RouteId::from("r1");
        let t0 = Instant::now();
        limiter.admit(&id, &spec(5.0, 1), t0);
        assert_eq!(limiter.buckets.lock().len(), 1);
        limiter.retain_known(&std::collections::HashSet::new());
        assert_eq!(limiter.buckets.lock().len(), 0);
    }
}
