//! Reconnect pacing for the ground link.
//!
//! Exponential backoff with jitter so a ground-station outage doesn't
//! turn into a tight reconnect loop and a log storm.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            max: max.max(base),
            current: base,
        }
    }

    /// Delay to sleep before the next attempt. Doubles per call, capped
    /// at the configured maximum, with up to 20% jitter added.
    pub fn next_delay(&mut self) -> Duration {
        let delay = with_jitter(self.current, 0.2);
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Call after a successful connect.
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    let delay_ms = delay.as_millis();
    let jitter_ms_max = ((delay_ms as f64) * ratio) as u128;
    if jitter_ms_max == 0 {
        return delay;
    }

    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    let jitter_ms = (now_nanos as u128) % (jitter_ms_max + 1);
    delay + Duration::from_millis(jitter_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_until_the_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(400));

        let first = backoff.next_delay();
        assert!(first >= Duration::from_millis(100));
        assert!(first <= Duration::from_millis(120));

        backoff.next_delay();
        let third = backoff.next_delay();
        assert!(third >= Duration::from_millis(400));
        assert!(third <= Duration::from_millis(480));

        // Saturated: further failures don't grow past the cap.
        let fourth = backoff.next_delay();
        assert!(fourth <= Duration::from_millis(480));
    }

    #[test]
    fn reset_returns_to_base() {
        let mut backoff = Backoff::new(Duration::from_millis(50), Duration::from_secs(1));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();

        let delay = backoff.next_delay();
        assert!(delay >= Duration::from_millis(50));
        assert!(delay <= Duration::from_millis(60));
    }
}
