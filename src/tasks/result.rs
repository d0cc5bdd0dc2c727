//! # Task identifiers and results.
//!
//! A [`TaskResult`] is produced exactly once for every dispatched task that ran to
//! completion (success, failure, timeout or panic). Tasks refused admission because
//! of cancellation, and results dropped by an overflow policy, produce none.

use std::fmt;

use crate::error::TaskError;

/// Identifier of a task, echoed in its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one task: its identifier plus a payload or a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult<T> {
    /// Identifier of the task that produced this result.
    pub id: TaskId,
    /// Payload on success, [`TaskError`] on failure.
    pub outcome: Result<T, TaskError>,
}

impl<T> TaskResult<T> {
    /// Creates a new result.
    pub fn new(id: TaskId, outcome: Result<T, TaskError>) -> Self {
        Self { id, outcome }
    }

    /// True if the task succeeded.
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the payload, if the task succeeded.
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// Returns the failure, if the task failed.
    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }
}
