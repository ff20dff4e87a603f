//! Per-route request counters backing `STATS_GET`.

use serde::{Deserialize, Serialize};

/// Running counters for one route. Latency percentiles are tracked with a
/// small fixed-size reservoir rather than a full histogram — adequate for
/// the control plane's own `STATS_GET`, not a metrics export surface.
#[derive(Debug, Clone, Default)]
pub struct RouteCounters {
    pub requests_total: u64,
    pub requests_5xx: u64,
    latencies_ms: Vec<u32>,
}

const RESERVOIR_CAP: usize = 512;

impl RouteCounters {
    pub fn record(&mut self, status: u16, latency_ms: u32) {
        self.requests_total += 1;
        if status >= 500 {
            self.requests_5xx += 1;
        }
        if self.latencies_ms.len() < RESERVOIR_CAP {
            self.latencies_ms.push(latency_ms);
        } else {
            let idx = (self.requests_total as usize) % RESERVOIR_CAP;
            self.latencies_ms[idx] = latency_ms;
        }
    }

    pub fn snapshot(&self, route_id: &str) -> RouteStats {
        let mut sorted = self.latencies_ms.clone();
        sorted.sort_unstable();
        RouteStats {
            route_id: route_id.to_string(),
            requests_total: self.requests_total,
            requests_5xx: self.requests_5xx,
            p50_ms: percentile(&sorted, 0.50),
            p95_ms: percentile(&sorted, 0.95),
        }
    }
}

fn percentile(sorted: &[u32], p: f64) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStats {
    pub route_id: String,
    pub requests_total: u64,
    pub requests_5xx: u64,
    pub p50_ms: u32,
    pub p95_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_known_distribution() {
        let mut counters = RouteCounters::default();
        for ms in [10, 20, 30, 40, 100] {
            counters.record(200, ms);
        }
        let stats = counters.snapshot("r1");
        assert_eq!(stats.requests_total, 5);
        assert_eq!(stats.requests_5xx, 0);
        assert_eq!(stats.p50_ms, 30);
    }

    #[test]
    fn counts_5xx_separately() {
        let mut counters = RouteCounters::default();
        counters.record(200, 5);
        counters.record(503, 5);
        counters.record(500, 5);
        let stats = counters.snapshot("r1");
        assert_eq!(stats.requests_total, 3);
        assert_eq!(stats.requests_5xx, 2);
    }
}
