//! # Delay policy between retry attempts.
//!
//! [`BackoffPolicy`] computes the wait before retry number `n` (0-indexed: the wait
//! after the first failed attempt is `delay(0)`).
//!
//! The base delay is `first × factor^n`, clamped to `max`; jitter is applied last and
//! never feeds back into the next base. With the default `factor = 1.0` every wait is
//! exactly `first`, which is the fixed inter-attempt delay the retry controller uses
//! unless told otherwise.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::BackoffPolicy;
//!
//! let fixed = BackoffPolicy::fixed(Duration::from_millis(250));
//! assert_eq!(fixed.delay(0), Duration::from_millis(250));
//! assert_eq!(fixed.delay(9), Duration::from_millis(250));
//!
//! let grow = BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(1));
//! assert_eq!(grow.delay(1), Duration::from_millis(200));
//! assert_eq!(grow.delay(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Inter-attempt delay policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any computed delay.
    pub max: Duration,
    /// Multiplicative growth per retry (`1.0` = fixed delay).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Fixed 100ms delay, no jitter.
    fn default() -> Self {
        Self::fixed(Duration::from_millis(100))
    }
}

impl BackoffPolicy {
    /// Same delay before every retry.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            first: interval,
            max: interval,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay growing by `factor` per retry, capped at `max`.
    pub fn exponential(first: Duration, factor: f64, max: Duration) -> Self {
        Self {
            first,
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns a copy with the given jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (0-indexed).
    ///
    /// Overflowing or non-finite intermediate values clamp to [`BackoffPolicy::max`].
    pub fn delay(&self, retry: u32) -> Duration {
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if secs.is_finite() && secs >= 0.0 && secs <= self.max.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_is_constant() {
        let policy = BackoffPolicy::fixed(Duration::from_millis(40));
        for retry in [0, 1, 5, 1000, u32::MAX] {
            assert_eq!(policy.delay(retry), Duration::from_millis(40));
        }
    }

    #[test]
    fn exponential_growth_until_cap() {
        let policy =
            BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_millis(700));
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(700));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(700));
    }

    #[test]
    fn first_above_max_is_clamped() {
        let policy =
            BackoffPolicy::exponential(Duration::from_secs(10), 2.0, Duration::from_secs(5));
        assert_eq!(policy.delay(0), Duration::from_secs(5));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_full() {
        let policy = BackoffPolicy::fixed(Duration::from_millis(1000)).with_jitter(JitterPolicy::Equal);
        for retry in 0..50 {
            let d = policy.delay(retry);
            assert!(d >= Duration::from_millis(500), "{d:?}");
            assert!(d <= Duration::from_millis(1000), "{d:?}");
        }
    }

    #[test]
    fn full_jitter_never_exceeds_base() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(30))
            .with_jitter(JitterPolicy::Full);
        for retry in 0..12 {
            let base = Duration::from_millis(100 * 2u64.pow(retry)).min(Duration::from_secs(30));
            assert!(policy.delay(retry) <= base);
        }
    }

    #[test]
    fn decorrelated_jitter_respects_floor_and_cap() {
        let policy = BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(2))
            .with_jitter(JitterPolicy::Decorrelated);
        for _ in 0..100 {
            let d = policy.delay(6);
            assert!(d >= Duration::from_millis(100), "{d:?}");
            assert!(d <= Duration::from_secs(2), "{d:?}");
        }
    }
}
