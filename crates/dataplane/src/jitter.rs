//! A small, dependency-free xorshift64 source for the drain admission
//! draw. Not cryptographic — it only needs to behave like a coin flip
//! weighted by the current traffic percent, not resist an adversary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static STATE: AtomicU64 = AtomicU64::new(0);

fn seed() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64 | 1
}

/// A pseudo-random value in `[0.0, 1.0)`.
pub fn unit_interval() -> f64 {
    let mut x = STATE.load(Ordering::Relaxed);
    if x == 0 {
        x = seed();
    }
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    STATE.store(x, Ordering::Relaxed);
    (x >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_unit_interval() {
        for _ in 0..1000 {
            let v = unit_interval();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
