use crate::cancel::CancelReason;

/// Terminal state of a retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// The operation succeeded.
    Done {
        /// Value returned by the successful attempt.
        value: T,
        /// Attempts made, including the successful one.
        attempts: u32,
    },

    /// Cancellation fired; the loop stopped without waiting further.
    Aborted {
        /// Why the signal fired.
        reason: CancelReason,
        /// Most recent failure (`None` if cancelled before the first attempt).
        last_error: Option<E>,
        /// Attempts made.
        attempts: u32,
    },

    /// The attempt cap was reached without success.
    Exhausted {
        /// Failure of the final attempt.
        last_error: E,
        /// Attempts made (equal to the cap).
        attempts: u32,
    },

    /// An attempt failed with an error that must not be retried.
    Rejected {
        /// The non-retryable error.
        error: E,
        /// Attempts made, including the rejected one.
        attempts: u32,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// Attempts made before reaching this outcome.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Done { attempts, .. }
            | RetryOutcome::Aborted { attempts, .. }
            | RetryOutcome::Exhausted { attempts, .. }
            | RetryOutcome::Rejected { attempts, .. } => *attempts,
        }
    }

    /// True for [`RetryOutcome::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, RetryOutcome::Done { .. })
    }

    /// Returns the value on success.
    pub fn into_value(self) -> Option<T> {
        match self {
            RetryOutcome::Done { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryOutcome::Done { .. } => "retry_done",
            RetryOutcome::Aborted { .. } => "retry_aborted",
            RetryOutcome::Exhausted { .. } => "retry_exhausted",
            RetryOutcome::Rejected { .. } => "retry_rejected",
        }
    }
}
