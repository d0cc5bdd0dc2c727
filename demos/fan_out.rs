//! # Example: fan_out
//!
//! Runs a fixed batch of tasks with at most three in flight, a per-task timeout and a
//! run deadline, and prints what came back.
//!
//! Shows how to:
//! - Limit concurrency with [`Config::max_concurrent`].
//! - Attach a custom [`Subscribe`] implementation.
//! - Read a [`Collected`] summary (successes, failures, status).
//!
//! ## Flow
//! ```text
//! Executor::fan_out(tasks)
//!     ├─► spawn × 10 ──► AdmissionGate (3 permits)
//!     │       ├─► TaskStarting ─► run ─► TaskCompleted | TaskFailed (+TimeoutHit)
//!     │       └─► ResultSink::offer
//!     └─► ResultStream::collect() ──► RunCompleted
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fan_out
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskgate::{
    Collected, Config, Event, EventKind, Executor, Subscribe, TaskError, TaskFn, TaskRef,
};
use tokio_util::sync::CancellationToken;

/// Tracks how many tasks are running according to the event stream.
#[derive(Default)]
struct InFlight {
    now: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait::async_trait]
impl Subscribe for InFlight {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::TaskStarting => {
                let now = self.now.fetch_add(1, Ordering::Relaxed) + 1;
                self.peak.fetch_max(now, Ordering::Relaxed);
            }
            EventKind::TaskCompleted | EventKind::TaskFailed => {
                self.now.fetch_sub(1, Ordering::Relaxed);
            }
            EventKind::TimeoutHit => {
                println!("[sub] task={:?} timed out after {:?}ms", ev.task, ev.timeout_ms);
            }
            EventKind::RunCompleted | EventKind::RunCancelled => {
                println!("[sub] run ended: {}", ev.reason.as_deref().unwrap_or(""));
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "in_flight"
    }
}

fn job(id: u64) -> TaskRef<String> {
    TaskFn::arc(id, move |ctx: CancellationToken| async move {
        let work = Duration::from_millis(50 * id);
        tokio::select! {
            _ = ctx.cancelled() => return Err(TaskError::Canceled),
            _ = tokio::time::sleep(work) => {}
        }
        if id % 4 == 3 {
            return Err(TaskError::fail(format!("job {id} hit a bad record")));
        }
        Ok(format!("job {id} processed in {work:?}"))
    })
}

fn report(collected: &Collected<String>) {
    for r in collected.succeeded() {
        println!("ok   {} → {}", r.id, r.value().map_or("", String::as_str));
    }
    for r in collected.failed() {
        println!("err  {} → {}", r.id, r.error().map(ToString::to_string).unwrap_or_default());
    }
    println!(
        "status={} results={} dropped={}",
        collected.status.as_label(),
        collected.results.len(),
        collected.dropped
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        max_concurrent: 3,
        timeout: Duration::from_millis(400),
        deadline: Duration::from_secs(2),
        ..Config::default()
    };

    let in_flight = Arc::new(InFlight::default());
    let exec = Executor::builder(cfg)
        .with_subscribers(vec![in_flight.clone() as Arc<dyn Subscribe>])
        .build();

    let tasks: Vec<TaskRef<String>> = (1..=10).map(job).collect();
    let collected = exec.fan_out(tasks, &exec.cancellation()).await;
    report(&collected);

    exec.shutdown().await;
    println!("peak in flight: {}", in_flight.peak.load(Ordering::Relaxed));
    anyhow::ensure!(in_flight.peak.load(Ordering::Relaxed) <= 3, "gate exceeded");
    Ok(())
}
