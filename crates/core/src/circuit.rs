//! Per-(session, route) circuit breaker state machine.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::route::CircuitBreakerSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    pub state: CircuitState,
    consecutive_failures: u32,
    open_until: Option<Instant>,
    half_open_budget_remaining: u32,
    spec: CircuitBreakerSpec,
}

impl CircuitBreaker {
    pub fn new(spec: CircuitBreakerSpec) -> Self {
        Self { state: CircuitState::Closed, consecutive_failures: 0, open_until: None, half_open_budget_remaining: 0, spec }
    }

    /// `CIRCUIT_BREAKER_RESET`: force back to `closed`.
    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.open_until = None;
        self.half_open_budget_remaining = 0;
    }

    /// Whether a request should be admitted right now, recomputing the
    /// `open` -> `half_open` transition against `now` first.
    pub fn should_admit(&mut self, now: Instant) -> bool {
        self.recompute(now);
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => self.half_open_budget_remaining > 0,
        }
    }

    /// Recompute `open -> half_open` on timer. Also driven by the sweeper's
    /// periodic pass so a breaker can half-open even with no live traffic.
    pub fn recompute(&mut self, now: Instant) {
        if self.state == CircuitState::Open {
            if let Some(until) = self.open_until {
                if now >= until {
                    self.state = CircuitState::HalfOpen;
                    self.half_open_budget_remaining = self.spec.half_open_probes.max(1);
                }
            }
        }
    }

    /// Record the result of a dispatched request: a 5xx or transport error
    /// increments the failure counter; success resets it.
    pub fn record_result(&mut self, now: Instant, success: bool) {
        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_budget_remaining = self.half_open_budget_remaining.saturating_sub(1);
                if success {
                    if self.half_open_budget_remaining == 0 {
                        self.reset();
                    }
                } else {
                    self.open(now);
                }
            }
            CircuitState::Closed => {
                if success {
                    self.consecutive_failures = 0;
                } else {
                    self.consecutive_failures += 1;
                    if self.consecutive_failures >= self.spec.failure_threshold {
                        self.open(now);
                    }
                }
            }
            CircuitState::Open => {
                // Dispatches aren't sent while open; nothing to record.
            }
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.open_until = Some(now + Duration::from_secs(self.spec.open_timeout_secs));
        self.half_open_budget_remaining = 0;
    }
}
