//! Backing state for `GET /system/ready` (spec §6): ready while the last
//! ingest commit and the last pricing-worker update are both recent.

use std::sync::RwLock;
use std::time::{Duration, Instant};

pub struct ReadinessTracker {
    last_commit_at: RwLock<Option<Instant>>,
    last_prices_update_at: RwLock<Option<Instant>>,
    threshold: Duration,
}

impl ReadinessTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            last_commit_at: RwLock::new(None),
            last_prices_update_at: RwLock::new(None),
            threshold,
        }
    }

    pub fn record_commit(&self) {
        *self.last_commit_at.write().unwrap() = Some(Instant::now());
    }

    pub fn record_prices_update(&self) {
        *self.last_prices_update_at.write().unwrap() = Some(Instant::now());
    }

    pub fn is_ready(&self) -> bool {
        let fresh = |at: &Option<Instant>| at.map_or(false, |t| t.elapsed() < self.threshold);
        fresh(&self.last_commit_at.read().unwrap()) && fresh(&self.last_prices_update_at.read().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_until_both_signals_seen() {
        let tracker = ReadinessTracker::new(Duration::from_secs(30));
        assert!(!tracker.is_ready());
        tracker.record_commit();
        assert!(!tracker.is_ready());
        tracker.record_prices_update();
        assert!(tracker.is_ready());
    }
}
