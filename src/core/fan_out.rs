//! # Exact-count dispatch.
//!
//! Every task gets its own spawned execution; the result channel is sized to the task
//! count, so no worker ever waits to publish and none is dropped.
//!
//! ```text
//! tasks[0..N] ──► spawn ──► run_task (gate, timeout, panic isolation) ──► sink.offer
//!                                                                            │
//!                              ResultStream (expected = N) ◄─────────────────┘
//! ```
//!
//! Executions are detached: a cancelled run stops *waiting*, it does not abort tasks.
//! Tasks observe cancellation through their child token.

use crate::cancel::Cancellation;
use crate::core::collector::{ResultStream, result_channel};
use crate::core::runner::{RunContext, run_task};
use crate::policies::OverflowPolicy;
use crate::tasks::TaskRef;

/// Spawns one execution per task and returns the stream of their results.
pub(crate) fn fan_out<T: Send + 'static>(
    tasks: Vec<TaskRef<T>>,
    ctx: &RunContext,
    cancel: &Cancellation,
) -> ResultStream<T> {
    let n = tasks.len();
    let (sink, stream) = result_channel(
        n,
        OverflowPolicy::Block,
        ctx.bus.clone(),
        cancel.clone(),
        Some(n),
    );

    for task in tasks {
        let sink = sink.clone();
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Some(result) = run_task(task, &ctx, &cancel, None).await {
                // Capacity equals the task count: this never drops.
                let _ = sink.offer(result);
            }
        });
    }
    stream
}
