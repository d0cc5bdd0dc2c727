//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per run. This avoids shared mutable state between runs.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{TaskError, TaskFn, TaskId, TaskRef};
//!
//! let t: TaskRef<u32> = TaskFn::arc(7, |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok(42u32)
//! });
//!
//! assert_eq!(t.id(), TaskId(7));
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::{Task, TaskId};

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per run.
pub struct TaskFn<F> {
    id: TaskId,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(id: u64, f: F) -> Self {
        Self {
            id: TaskId(id),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(id: u64, f: F) -> Arc<Self> {
        Arc::new(Self::new(id, f))
    }
}

#[async_trait]
impl<F, Fut, T> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn id(&self) -> TaskId {
        self.id
    }

    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError> {
        (self.f)(ctx).await
    }
}
