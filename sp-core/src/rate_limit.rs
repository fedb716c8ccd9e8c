use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};

/// Sliding-window budget on backend calls.
///
/// Holds one timestamp per admitted call; entries are pruned relative to
/// "now" on every read, so the invariant after any query is that all retained
/// records fall inside the window. Callers must pair `can_make_call` with
/// `record_call` immediately before the backend call; the pair is only atomic
/// on a single control thread.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Vec<DateTime<Utc>>,
    clock: Box<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window_minutes: i64) -> Self {
        Self::with_clock(max_calls, window_minutes, Box::new(SystemClock))
    }

    pub fn with_clock(max_calls: usize, window_minutes: i64, clock: Box<dyn Clock>) -> Self {
        Self {
            max_calls,
            window: Duration::minutes(window_minutes.max(1)),
            calls: Vec::new(),
            clock,
        }
    }

    /// True when another backend call fits in the current window.
    ///
    /// Prunes stale records as a side effect. Records dated after "now" are
    /// dropped too, so a backward clock jump cannot pin the limiter shut.
    pub fn can_make_call(&mut self) -> bool {
        self.prune();
        self.calls.len() < self.max_calls
    }

    /// Record an admitted call. Call only after `can_make_call` returned true.
    pub fn record_call(&mut self) {
        self.calls.push(self.clock.now());
    }

    /// Seconds until the next call is admissible; 0 when one already is.
    pub fn time_until_next_call(&mut self) -> u64 {
        if self.can_make_call() {
            return 0;
        }
        let Some(oldest) = self.calls.iter().min().copied() else {
            return 0;
        };
        let remaining = oldest + self.window - self.clock.now();
        let millis = remaining.num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        // Round up so callers never retry a second early.
        (millis as u64).div_ceil(1000)
    }

    fn prune(&mut self) {
        let now = self.clock.now();
        let cutoff = now - self.window;
        self.calls.retain(|t| *t > cutoff && *t <= now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn at(now: DateTime<Utc>) -> std::sync::Arc<Self> {
            std::sync::Arc::new(Self {
                now: Mutex::new(now),
            })
        }

        fn set(&self, now: DateTime<Utc>) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for std::sync::Arc<ManualClock> {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn empty_limiter_always_admits() {
        let mut limiter = RateLimiter::new(10, 1);
        assert!(limiter.can_make_call());
        assert_eq!(limiter.time_until_next_call(), 0);
    }

    #[test]
    fn admits_up_to_max_then_denies() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(3, 1, Box::new(clock));
        for _ in 0..3 {
            assert!(limiter.can_make_call());
            limiter.record_call();
        }
        assert!(!limiter.can_make_call());
    }

    #[test]
    fn wait_matches_oldest_record_expiry() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(1, 1, Box::new(clock.clone()));
        limiter.record_call();
        clock.set(epoch() + Duration::seconds(20));
        assert!(!limiter.can_make_call());
        assert_eq!(limiter.time_until_next_call(), 40);
    }

    #[test]
    fn subsecond_remainder_rounds_up() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(1, 1, Box::new(clock.clone()));
        limiter.record_call();
        clock.set(epoch() + Duration::milliseconds(59_500));
        assert_eq!(limiter.time_until_next_call(), 1);
    }

    #[test]
    fn window_expiry_readmits() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(1, 1, Box::new(clock.clone()));
        limiter.record_call();
        assert!(!limiter.can_make_call());
        clock.set(epoch() + Duration::seconds(61));
        assert!(limiter.can_make_call());
        assert_eq!(limiter.time_until_next_call(), 0);
    }

    #[test]
    fn two_calls_in_same_second_wait_a_full_window() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(1, 1, Box::new(clock));
        assert!(limiter.can_make_call());
        limiter.record_call();
        assert!(!limiter.can_make_call());
        let wait = limiter.time_until_next_call();
        assert!((59..=60).contains(&wait), "wait was {wait}");
    }

    #[test]
    fn backward_clock_jump_drops_future_records() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(1, 1, Box::new(clock.clone()));
        limiter.record_call();
        clock.set(epoch() - Duration::minutes(10));
        assert!(limiter.can_make_call());
        assert_eq!(limiter.time_until_next_call(), 0);
    }

    #[test]
    fn wait_is_zero_iff_admissible() {
        let clock = ManualClock::at(epoch());
        let mut limiter = RateLimiter::with_clock(2, 1, Box::new(clock.clone()));
        assert_eq!(limiter.time_until_next_call(), 0);
        limiter.record_call();
        assert_eq!(limiter.time_until_next_call(), 0);
        limiter.record_call();
        assert!(limiter.time_until_next_call() > 0);
    }

    proptest! {
        // A burst of attempts faster than the window never admits more than
        // max_calls inside any single window span.
        #[test]
        fn never_exceeds_budget_within_window(
            max_calls in 1usize..20,
            step_ms in 1i64..2_000,
            attempts in 1usize..200,
        ) {
            let clock = ManualClock::at(epoch());
            let mut limiter = RateLimiter::with_clock(max_calls, 1, Box::new(clock.clone()));
            let mut admitted: Vec<DateTime<Utc>> = Vec::new();

            for i in 0..attempts {
                let now = epoch() + Duration::milliseconds(step_ms * i as i64);
                clock.set(now);
                if limiter.can_make_call() {
                    limiter.record_call();
                    admitted.push(now);
                }
            }

            for (i, start) in admitted.iter().enumerate() {
                let in_window = admitted[i..]
                    .iter()
                    .take_while(|t| **t < *start + Duration::minutes(1))
                    .count();
                prop_assert!(in_window <= max_calls);
            }
        }
    }
}
