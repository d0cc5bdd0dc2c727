//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable, producing a value).
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` whose ownership moves
//! from the dispatcher to the worker that runs it.
//!
//! A task receives a [`CancellationToken`] and should check it to stop
//! cooperatively: cancellation is never preemptive.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::TaskId;

/// Shared handle to a task producing `T`.
pub type TaskRef<T> = Arc<dyn Task<Output = T>>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` has a stable [`id`](Task::id) and an async [`run`](Task::run) method that
/// receives a [`CancellationToken`].
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use taskgate::{Task, TaskError, TaskId};
///
/// struct Square(u64);
///
/// #[async_trait]
/// impl Task for Square {
///     type Output = u64;
///
///     fn id(&self) -> TaskId { TaskId(self.0) }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<u64, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(self.0 * self.0)
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Returns the task identifier echoed in its [`TaskResult`](crate::TaskResult).
    fn id(&self) -> TaskId;

    /// Executes the task until completion or cancellation.
    ///
    /// Implementations should check `ctx.is_cancelled()` (or select on
    /// `ctx.cancelled()`) and return [`TaskError::Canceled`] promptly.
    async fn run(&self, ctx: CancellationToken) -> Result<Self::Output, TaskError>;
}
