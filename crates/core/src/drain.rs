//! Per-session drain state.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPhase {
    None,
    Draining,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone)]
pub struct DrainState {
    pub phase: DrainPhase,
    started_at: Option<Instant>,
    duration: Duration,
}

impl Default for DrainState {
    fn default() -> Self {
        Self { phase: DrainPhase::None, started_at: None, duration: Duration::ZERO }
    }
}

impl DrainState {
    /// `DRAIN_START`: record the start time and duration.
    pub fn start(&mut self, now: Instant, duration: Duration) {
        self.phase = DrainPhase::Draining;
        self.started_at = Some(now);
        self.duration = duration;
    }

    /// `DRAIN_CANCEL`: return to `none`. The `Cancelled` phase value exists
    /// in the data model for a caller that wants to distinguish "never
    /// drained" from "drain was cancelled" via a side channel, but
    /// `DRAIN_STATUS` after a cancel reports `none`.
    pub fn cancel(&mut self) {
        self.phase = DrainPhase::None;
        self.started_at = None;
    }

    /// Recompute phase against the current time; transitions `draining` to
    /// `completed` once elapsed >= duration. Called both inline by the
    /// dataplane's admission check and by the registry's periodic sweeper.
    pub fn recompute(&mut self, now: Instant) {
        if self.phase == DrainPhase::Draining {
            if let Some(started) = self.started_at {
                if now.saturating_duration_since(started) >= self.duration {
                    self.phase = DrainPhase::Completed;
                }
            }
        }
    }

    /// Elapsed/remaining/traffic-percent as of `now`: 100 at start, 50 at
    /// 50% elapsed, 0 at completion.
    pub fn status(&self, now: Instant) -> DrainStatus {
        let elapsed = self.started_at.map(|s| now.saturating_duration_since(s)).unwrap_or(Duration::ZERO);
        let remaining = self.duration.saturating_sub(elapsed);
        let traffic_percent = if self.duration.is_zero() {
            0.0
        } else {
            let frac = elapsed.as_secs_f64() / self.duration.as_secs_f64();
            (100.0 * (1.0 - frac)).clamp(0.0, 100.0)
        };
        DrainStatus {
            phase: self.phase,
            started_at_epoch_ms: None,
            duration_seconds: self.duration.as_secs(),
            remaining_seconds: remaining.as_secs(),
            traffic_percent,
        }
    }

    /// Admission probability for a request arriving now: equal to the
    /// current traffic percent.
    pub fn admission_probability(&self, now: Instant) -> f64 {
        self.status(now).traffic_percent / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainStatus {
    pub phase: DrainPhase,
    pub started_at_epoch_ms: Option<u64>,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub traffic_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traffic_percent_decays_linearly() {
        let mut state = DrainState::default();
        let t0 = Instant::now();
        state.start(t0, Duration::from_secs(60));

        assert_eq!(state.status(t0).traffic_percent, 100.0);
        assert_eq!(state.status(t0 + Duration::from_secs(30)).traffic_percent, 50.0);
        assert_eq!(state.status(t0 + Duration::from_secs(60)).traffic_percent, 0.0);
    }

    #[test]
    fn phase_transitions_to_completed_at_elapsed() {
        let mut state = DrainState::default();
        let t0 = Instant::now();
        state.start(t0, Duration::from_secs(10));
        state.recompute(t0 + Duration::from_secs(5));
        assert_eq!(state.phase, DrainPhase::Draining);
        state.recompute(t0 + Duration::from_secs(10));
        assert_eq!(state.phase, DrainPhase::Completed);
    }

    #[test]
    fn cancel_returns_to_none() {
        let mut state = DrainState::default();
        let t0 = Instant::now();
        state.start(t0, Duration::from_secs(10));
        state.cancel();
        assert_eq!(state.phase, DrainPhase::None);
    }
}
