//! Dataplane-local mirror of each route's circuit breaker.
//!
//! The registry's `Session` owns the breaker that backs `CIRCUIT_BREAKER_STATUS`/
//! `CIRCUIT_BREAKER_RESET`, but it only ever sees the configured spec and a
//! periodic sweep, never a live request outcome — the dataplane is the
//! process that actually dials backends. So the dataplane drives its own
//! breaker instance per route, seeded from the `CircuitBreakerSpec` the
//! index snapshot carries, and is the one that records request results. The registry-side
//! breaker and this one can disagree briefly after a backend blip; both
//! converge once the dataplane reports enough results of its own, and
//! `CIRCUIT_BREAKER_RESET` still forces the registry's copy closed for
//! operator visibility even though it can't reach across into this process.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use rrcp_core::{CircuitBreaker, CircuitBreakerSpec, RouteId};

#[derive(Default)]
pub struct CircuitBreakers {
    breakers: Mutex<HashMap<RouteId, CircuitBreaker>>,
}

impl CircuitBreakers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request to `route_id` should be admitted right now. Routes
    /// with no circuit breaker spec always admit.
    pub fn should_admit(&self, route_id: &RouteId, spec: Option<&CircuitBreakerSpec>, now: Instant) -> bool {
        let Some(spec) = spec else { return true };
        let mut breakers = self.breakers.lock();
        let cb = breakers.entry(route_id.clone()).or_insert_with(|| CircuitBreaker::new(spec.clone()));
        cb.should_admit(now)
    }

    pub fn record_result(&self, route_id: &RouteId, spec: Option<&CircuitBreakerSpec>, now: Instant, success: bool) {
        let Some(spec) = spec else { return };
        let mut breakers = self.breakers.lock();
        let cb = breakers.entry(route_id.clone()).or_insert_with(|| CircuitBreaker::new(spec.clone()));
        cb.record_result(now, success);
    }

    pub fn retain_known(&self, known: &std::collections::HashSet<RouteId>) {
        self.breakers.lock().retain(|id, _| known.contains(id));
    }
}
