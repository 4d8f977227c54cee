//! Per-leg position advancer.
//!
//! A `Locator` walks the great-circle leg between two points at a fixed
//! speed, producing one interpolated position per tick. The bearing is
//! recomputed from the current position on every tick, so a long leg
//! follows the geodesic instead of holding the initial heading.

use std::time::Duration;

use crate::geo;
use crate::models::LatLng;

/// Fixed simulation tick interval.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct Locator {
    end: LatLng,
    current: LatLng,
    step_m: f64,
    total_m: f64,
    remaining_m: f64,
}

impl Locator {
    /// Set up a leg from `start` to `end` at `speed_mps` meters per second.
    pub fn new(start: LatLng, end: LatLng, speed_mps: f64) -> Self {
        let total_m = geo::distance(start, end);
        Self {
            end,
            current: start,
            step_m: speed_mps * TICK_INTERVAL.as_secs_f64(),
            total_m,
            remaining_m: total_m,
        }
    }

    /// Wait one tick, then advance along the leg.
    ///
    /// While more than one step remains, moves one step along the bearing
    /// from the current position to the end. Otherwise snaps to the exact
    /// `end` value. Calling again after arrival keeps returning `end`.
    pub async fn next(&mut self) -> LatLng {
        tokio::time::sleep(TICK_INTERVAL).await;

        if self.remaining_m > self.step_m {
            let bearing = geo::bearing(self.current, self.end);
            self.current = geo::destination(self.current, self.step_m, bearing);
            self.remaining_m -= self.step_m;
        } else {
            self.current = self.end;
            self.remaining_m = 0.0;
        }

        self.current
    }

    /// Full leg length in meters.
    pub fn total_m(&self) -> f64 {
        self.total_m
    }

    /// Meters left until the position snaps to the destination.
    pub fn remaining_m(&self) -> f64 {
        self.remaining_m
    }

    /// Position as of the most recent tick.
    pub fn current(&self) -> LatLng {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_leg() -> (LatLng, LatLng) {
        let start = LatLng::new(37.7833, -122.4167);
        // ~100 m north of the start.
        let end = geo::destination(start, 100.0, 0.0);
        (start, end)
    }

    #[tokio::test(start_paused = true)]
    async fn advances_one_step_per_tick() {
        let (start, end) = short_leg();
        // 100 m/s -> 25 m per tick.
        let mut locator = Locator::new(start, end, 100.0);
        assert!((locator.total_m() - 100.0).abs() < 0.01);

        let first = locator.next().await;
        assert_ne!(first, start);
        assert!((locator.remaining_m() - 75.0).abs() < 0.01);
        assert!((geo::distance(start, first) - 25.0).abs() < 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn snaps_exactly_to_destination() {
        let (start, end) = short_leg();
        let mut locator = Locator::new(start, end, 100.0);

        // 100 m at 25 m per tick: snapped within a handful of ticks even
        // if the measured leg length is a hair off 100.
        let mut position = start;
        for _ in 0..6 {
            position = locator.next().await;
        }

        // Bit-for-bit equality, not a distance threshold.
        assert_eq!(position, end);
        assert_eq!(locator.remaining_m(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn idempotent_after_arrival() {
        let (start, end) = short_leg();
        let mut locator = Locator::new(start, end, 100.0);

        for _ in 0..6 {
            locator.next().await;
        }
        assert_eq!(locator.current(), end);

        for _ in 0..3 {
            assert_eq!(locator.next().await, end);
            assert_eq!(locator.remaining_m(), 0.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_distance_never_increases() {
        let (start, end) = short_leg();
        let mut locator = Locator::new(start, end, 30.0);

        let mut previous = locator.remaining_m();
        for _ in 0..20 {
            locator.next().await;
            let remaining = locator.remaining_m();
            assert!(remaining <= previous);
            assert!(remaining >= 0.0);
            previous = remaining;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_length_leg_stays_put() {
        let start = LatLng::new(10.0, 20.0);
        let mut locator = Locator::new(start, start, 50.0);

        assert_eq!(locator.total_m(), 0.0);
        assert_eq!(locator.next().await, start);
        assert_eq!(locator.remaining_m(), 0.0);
    }
}
