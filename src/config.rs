//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for an [`Executor`](crate::Executor).
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no admission gate created)
//! - `workers = 0` → one pool worker per available CPU
//! - `timeout = 0s` → no per-task timeout
//! - `deadline = 0s` → [`Executor::cancellation`](crate::Executor::cancellation) has no deadline
//! - `queue_capacity`, `result_capacity`, `bus_capacity` are clamped to a minimum of 1

use std::time::Duration;

use crate::gate::available_parallelism;
use crate::policies::OverflowPolicy;
use crate::retry::RetryPolicy;

/// Global configuration for the executor runtime.
///
/// All fields are public; prefer the accessors, which resolve sentinel values.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of tasks holding a permit at once (`0` = unlimited).
    ///
    /// Applies to both fan-out and pool mode.
    pub max_concurrent: usize,

    /// Number of long-lived workers in pool mode (`0` = available parallelism).
    pub workers: usize,

    /// Capacity of the pool input queue.
    ///
    /// `Submitter::submit` waits while it is full; `try_submit` fails with `Full`.
    pub queue_capacity: usize,

    /// Capacity of the pool result channel.
    ///
    /// Fan-out mode ignores this and sizes its channel to the task count.
    pub result_capacity: usize,

    /// What pool workers do when the result channel is full.
    pub overflow: OverflowPolicy,

    /// Per-task timeout (`0s` = none).
    pub timeout: Duration,

    /// Default run deadline used by [`Executor::cancellation`](crate::Executor::cancellation)
    /// (`0s` = none).
    pub deadline: Duration,

    /// Capacity of the event bus ring buffer.
    pub bus_capacity: usize,

    /// Default policy for [`Executor::retry`](crate::Executor::retry).
    pub retry: RetryPolicy,
}

impl Config {
    /// Returns the concurrency limit as an `Option`.
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        match self.max_concurrent {
            0 => None,
            n => Some(n),
        }
    }

    /// Returns the number of pool workers, resolving `0` to available parallelism.
    #[inline]
    pub fn worker_count(&self) -> usize {
        match self.workers {
            0 => available_parallelism(),
            n => n,
        }
    }

    /// Returns the per-task timeout as an `Option`.
    #[inline]
    pub fn task_timeout(&self) -> Option<Duration> {
        Some(self.timeout).filter(|d| !d.is_zero())
    }

    /// Returns the default run deadline as an `Option`.
    #[inline]
    pub fn run_deadline(&self) -> Option<Duration> {
        Some(self.deadline).filter(|d| !d.is_zero())
    }

    /// Input queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Result channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn result_capacity_clamped(&self) -> usize {
        self.result_capacity.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_concurrent = 0` (unlimited)
    /// - `workers = 0` (available parallelism)
    /// - `queue_capacity = 1` (one submission may run ahead of the workers)
    /// - `result_capacity = 1`, `overflow = Block`
    /// - `timeout = 0s`, `deadline = 0s`
    /// - `bus_capacity = 1024`
    /// - `retry = RetryPolicy::default()` (fixed 100ms, unlimited attempts)
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            workers: 0,
            queue_capacity: 1,
            result_capacity: 1,
            overflow: OverflowPolicy::Block,
            timeout: Duration::ZERO,
            deadline: Duration::ZERO,
            bus_capacity: 1024,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_resolve() {
        let cfg = Config::default();
        assert_eq!(cfg.concurrency_limit(), None);
        assert!(cfg.worker_count() >= 1);
        assert_eq!(cfg.task_timeout(), None);
        assert_eq!(cfg.run_deadline(), None);
    }

    #[test]
    fn capacities_clamp_to_one() {
        let cfg = Config {
            queue_capacity: 0,
            result_capacity: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.result_capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn explicit_values_pass_through() {
        let cfg = Config {
            max_concurrent: 3,
            workers: 2,
            timeout: Duration::from_millis(10),
            deadline: Duration::from_secs(1),
            ..Config::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(3));
        assert_eq!(cfg.worker_count(), 2);
        assert_eq!(cfg.task_timeout(), Some(Duration::from_millis(10)));
        assert_eq!(cfg.run_deadline(), Some(Duration::from_secs(1)));
    }
}
