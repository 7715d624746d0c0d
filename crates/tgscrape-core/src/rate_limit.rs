//! Randomized delay between accepted posts

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Clock;

/// Sleeps for a duration drawn uniformly from `[0, max_sleep)`.
///
/// No adaptive backoff here; sources that see throttling responses handle
/// that in their own retry layer.
#[derive(Debug)]
pub struct RateLimiter {
    max_sleep: Duration,
    rng: StdRng,
}

impl RateLimiter {
    pub fn new(max_sleep: Duration) -> Self {
        Self {
            max_sleep,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic delays for tests and reproducible runs
    pub fn seeded(max_sleep: Duration, seed: u64) -> Self {
        Self {
            max_sleep,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn max_sleep(&self) -> Duration {
        self.max_sleep
    }

    /// Draw the next delay without sleeping
    pub fn next_delay(&mut self) -> Duration {
        if self.max_sleep.is_zero() {
            return Duration::ZERO;
        }
        let secs = self.rng.gen_range(0.0..self.max_sleep.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Block on `clock` for a random delay; returns the delay used.
    pub fn delay(&mut self, clock: &dyn Clock) -> Duration {
        let d = self.next_delay();
        clock.sleep(d);
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn zero_ceiling_never_sleeps() {
        let mut limiter = RateLimiter::new(Duration::ZERO);
        let clock = ManualClock::new();
        for _ in 0..10 {
            assert_eq!(limiter.delay(&clock), Duration::ZERO);
        }
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn delays_stay_below_ceiling() {
        let max = Duration::from_millis(100);
        let mut limiter = RateLimiter::seeded(max, 7);
        for _ in 0..1_000 {
            assert!(limiter.next_delay() < max);
        }
    }

    #[test]
    fn seeded_is_reproducible() {
        let max = Duration::from_secs(2);
        let mut a = RateLimiter::seeded(max, 42);
        let mut b = RateLimiter::seeded(max, 42);
        for _ in 0..20 {
            assert_eq!(a.next_delay(), b.next_delay());
        }
    }

    #[test]
    fn delay_advances_clock() {
        let mut limiter = RateLimiter::seeded(Duration::from_secs(1), 3);
        let clock = ManualClock::new();
        let d = limiter.delay(&clock);
        assert_eq!(clock.now(), d);
    }
}
