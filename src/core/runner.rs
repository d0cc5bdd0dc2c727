//! # Run a single task.
//!
//! Executes one [`Task`](crate::Task) under the admission gate, with optional timeout
//! and panic isolation, and publishes lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Refused:
//!   cancelled / gate closed  → publish AdmissionRefused → no result
//!
//! Success:
//!   permit → TaskStarting → task.run() → Ok(v)  → publish TaskCompleted
//!
//! Failure:
//!   permit → TaskStarting → task.run() → Err(e) → publish TaskFailed
//!
//! Timeout:
//!   permit → TaskStarting → timeout exceeded → cancel child → publish TimeoutHit
//!                                                           → publish TaskFailed
//! Panic:
//!   permit → TaskStarting → panic caught → publish TaskFailed (Panicked)
//! ```
//!
//! ## Rules
//! - A task that started produces **exactly one** result.
//! - The permit is released **before** the result is handed to the result channel,
//!   so a slow collector never holds permits hostage.
//! - Each task gets a **child token**; cancelling it does not affect the run.

use std::time::Duration;

use futures::FutureExt;
use tokio::time;

use crate::cancel::Cancellation;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::gate::AdmissionGate;
use crate::subscribers::panic_message;
use crate::tasks::{TaskId, TaskRef, TaskResult};

/// Per-run settings shared by every execution context.
#[derive(Clone, Debug)]
pub(crate) struct RunContext {
    /// Optional admission gate (`None` = unlimited).
    pub gate: Option<AdmissionGate>,
    /// Optional per-task timeout.
    pub timeout: Option<Duration>,
    /// Event bus.
    pub bus: Bus,
}

/// Runs `task` once.
///
/// Returns `None` only when the task never started (admission refused).
pub(crate) async fn run_task<T: Send + 'static>(
    task: TaskRef<T>,
    ctx: &RunContext,
    cancel: &Cancellation,
    worker: Option<usize>,
) -> Option<TaskResult<T>> {
    let id = task.id();

    let permit = match &ctx.gate {
        Some(gate) => match gate.acquire(cancel).await {
            Ok(permit) => Some(permit),
            Err(e) => {
                publish_refused(&ctx.bus, id, &e.to_string());
                return None;
            }
        },
        None => {
            if let Some(reason) = cancel.reason() {
                publish_refused(&ctx.bus, id, &reason.to_string());
                return None;
            }
            None
        }
    };

    let mut starting = Event::new(EventKind::TaskStarting).with_task(id);
    if let Some(w) = worker {
        starting = starting.with_worker(w);
    }
    ctx.bus.publish(starting);

    let outcome = execute(&task, ctx, cancel).await;
    drop(permit);

    match &outcome {
        Ok(_) => ctx
            .bus
            .publish(Event::new(EventKind::TaskCompleted).with_task(id)),
        Err(e) => ctx.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(id)
                .with_reason(e.to_string()),
        ),
    }
    Some(TaskResult::new(id, outcome))
}

/// Executes the task body with a child token, optional timeout and panic isolation.
async fn execute<T: Send + 'static>(
    task: &TaskRef<T>,
    ctx: &RunContext,
    cancel: &Cancellation,
) -> Result<T, TaskError> {
    let child = cancel.token();
    let fut = std::panic::AssertUnwindSafe(task.run(child.clone())).catch_unwind();

    let caught = match ctx.timeout.filter(|d| !d.is_zero()) {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(caught) => caught,
            Err(_elapsed) => {
                child.cancel();
                ctx.bus.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_task(task.id())
                        .with_timeout(dur),
                );
                return Err(TaskError::Timeout { timeout: dur });
            }
        },
        None => fut.await,
    };

    caught.unwrap_or_else(|payload| {
        Err(TaskError::Panicked {
            info: panic_message(payload.as_ref()),
        })
    })
}

fn publish_refused(bus: &Bus, id: TaskId, reason: &str) {
    bus.publish(
        Event::new(EventKind::AdmissionRefused)
            .with_task(id)
            .with_reason(reason),
    );
}
