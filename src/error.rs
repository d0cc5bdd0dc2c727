//! Error types used by the taskgate runtime and tasks.
//!
//! This module defines three error enums:
//!
//! - [`TaskError`] — errors raised by an individual unit of work.
//! - [`AdmissionError`] — a permit could not be granted by the [`AdmissionGate`](crate::AdmissionGate).
//! - [`SubmitError`] — a task could not be handed to a worker pool.
//!
//! Every enum provides `as_label` (stable snake_case label for logs/metrics).
//! Cancellation is the only condition treated as a normal termination; it is carried
//! as a [`CancelReason`] rather than an opaque message.

use std::time::Duration;
use thiserror::Error;

use crate::cancel::CancelReason;

/// # Errors produced by task execution.
///
/// A failed task is recorded as a failed [`TaskResult`](crate::TaskResult);
/// it never stops other tasks of the same run.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution exceeded its per-attempt timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error; [`Retry::run_while`](crate::Retry::run_while) with
    /// [`TaskError::is_retryable`] stops on it.
    #[error("fatal error (no retry): {reason}")]
    Fatal {
        /// The underlying error message.
        reason: String,
    },

    /// Task execution failed but may succeed if retried.
    #[error("execution failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// Task observed cancellation and stopped early.
    #[error("context cancelled")]
    Canceled,

    /// Task panicked; the panic was caught by the worker.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        TaskError::Fail {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(reason: impl Into<String>) -> Self {
        TaskError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`],
    /// `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}

/// # Errors produced while waiting for a permit.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// Cancellation fired before (or while) waiting for a permit.
    #[error("admission refused: {0}")]
    Cancelled(CancelReason),

    /// The gate was closed; no more permits will ever be granted.
    #[error("admission gate closed")]
    Closed,
}

impl AdmissionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmissionError::Cancelled(_) => "admission_cancelled",
            AdmissionError::Closed => "admission_closed",
        }
    }
}

/// # Errors returned when handing a task to a worker pool.
///
/// The rejected task is not returned; build a new one if the caller wants to resubmit.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Input queue is full (try again later or use async `submit`).
    #[error("input queue full")]
    Full,

    /// All workers are gone (cancelled run or pool already shut down).
    #[error("input queue closed")]
    Closed,

    /// Cancellation fired while waiting for room in the input queue.
    #[error("submission cancelled: {0}")]
    Cancelled(CancelReason),
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full => "submit_full",
            SubmitError::Closed => "submit_closed",
            SubmitError::Cancelled(_) => "submit_cancelled",
        }
    }
}
