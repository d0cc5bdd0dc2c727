//! # taskgate
//!
//! **Taskgate** is a bounded concurrent task executor for Tokio.
//!
//! It runs batches or streams of async tasks with a cap on how many run at once,
//! collects their results through bounded channels, and stops waiting cleanly when a
//! deadline or a manual cancel fires. A standalone retry controller wraps any single
//! fallible operation with interruptible waits.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  tasks (Vec<TaskRef<T>>)         Submitter::submit(task)
//!          │                                │
//!          ▼                                ▼
//! ┌─────────────────────┐       ┌─────────────────────────┐
//! │ fan_out (exact N)   │       │ pool (N workers,        │
//! │ one spawn per task  │       │ shared bounded queue)   │
//! └─────────┬───────────┘       └────────────┬────────────┘
//!           └──────────────┬─────────────────┘
//!                          ▼
//!            ┌───────────────────────────┐      ┌──────────────────┐
//!            │ runner: AdmissionGate     │◄────►│ Cancellation     │
//!            │ acquire → run → release   │      │ (deadline/manual/│
//!            │ timeout · panic isolation │      │  OS signal)      │
//!            └─────────────┬─────────────┘      └────────┬─────────┘
//!                          ▼                             │
//!            ┌───────────────────────────┐               │
//!            │ ResultSink (Block | Drop) │               │
//!            └─────────────┬─────────────┘               │
//!                          ▼                             │
//!            ┌───────────────────────────┐               │
//!            │ ResultStream / collect()  │◄──────────────┘
//!            │ → Collected { results,    │  stops early, drains buffer
//!            │   dropped, status }       │
//!            └───────────────────────────┘
//!
//!   every component ── publish(Event) ──► Bus ──► SubscriberSet (LogWriter, ...)
//! ```
//!
//! ### Retry
//! ```text
//! Attempting ──ok──► Done
//!     │
//!    err ──► cancelled? ──yes──► Aborted
//!                │
//!                no ──► retryable? ──no──► Rejected
//!                           │
//!                          yes ──► max attempts? ──yes──► Exhausted
//!                                      │
//!                                      no ──► wait(backoff) ⟂ cancel ──cancel──► Aborted
//!                                                  │
//!                                                  └──elapsed──► Attempting
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                       |
//! |-------------------|--------------------------------------------------------------|------------------------------------------|
//! | Admission         | Counting permit pool; acquire races cancellation             | [`AdmissionGate`], [`Permit`]            |
//! | Dispatch          | Exact-count fan-out and fixed worker pools                   | [`Executor`], [`Submitter`]              |
//! | Collection        | Bounded result channel with `Block`/`Drop` overflow          | [`ResultStream`], [`Collected`]          |
//! | Cancellation      | Write-once signal: deadline, manual trigger, OS signal       | [`Cancellation`], [`CancelReason`]       |
//! | Retry             | Interruptible retry loop with backoff and jitter             | [`Retry`], [`RetryPolicy`]               |
//! | Observability     | Broadcast event bus with isolated subscribers                | [`Event`], [`Bus`], [`Subscribe`]        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{Config, Executor, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = Config {
//!         max_concurrent: 2,
//!         deadline: Duration::from_secs(5),
//!         ..Config::default()
//!     };
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = vec![Arc::new(taskgate::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();
//!
//!     let exec = Executor::builder(cfg).with_subscribers(subs).build();
//!
//!     let tasks: Vec<TaskRef<String>> = (1..=3)
//!         .map(|i| {
//!             TaskFn::arc(i, move |ctx: CancellationToken| async move {
//!                 if ctx.is_cancelled() {
//!                     return Err(TaskError::Canceled);
//!                 }
//!                 Ok(format!("job {i} done"))
//!             }) as TaskRef<String>
//!         })
//!         .collect();
//!
//!     let collected = exec.fan_out(tasks, &exec.cancellation()).await;
//!     assert!(collected.is_complete());
//!     assert_eq!(collected.results.len(), 3);
//!
//!     exec.shutdown().await;
//! }
//! ```

mod cancel;
mod config;
mod core;
mod error;
mod events;
mod gate;
mod policies;
mod retry;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use cancel::{CancelReason, Cancellation};
pub use config::Config;
pub use self::core::{
    Collected, Executor, ExecutorBuilder, Offer, ResultSink, ResultStream, RunStatus, Submitter,
    result_channel,
};
pub use error::{AdmissionError, SubmitError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use gate::{AdmissionGate, Permit};
pub use policies::{BackoffPolicy, JitterPolicy, OverflowPolicy};
pub use retry::{Retry, RetryOutcome, RetryPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskId, TaskRef, TaskResult};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
