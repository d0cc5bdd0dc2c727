use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Retry configuration.
///
/// The default is a fixed 100ms delay with no attempt cap: the loop runs until the
/// operation succeeds or cancellation fires.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RetryPolicy {
    /// Delay before each attempt beyond the first.
    pub backoff: BackoffPolicy,
    /// Maximum number of attempts (`None` = unlimited; `Some(0)` behaves as `Some(1)`).
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Fixed `interval` between attempts, unlimited attempts.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            backoff: BackoffPolicy::fixed(interval),
            max_attempts: None,
        }
    }

    /// Returns a copy capped at `n` attempts.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Returns a copy with a different delay policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// True once `attempts` has reached the cap.
    pub(crate) fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.max(1))
    }
}
