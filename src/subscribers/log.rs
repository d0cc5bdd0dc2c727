//! # LogWriter — simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for demos and debugging.
//!
//! ## Example output
//! ```text
//! [starting] task=3 worker=Some(1)
//! [failed] task=3 err="execution failed: boom"
//! [timeout] task=4 timeout_ms=50
//! [retry-scheduled] attempt=2 delay_ms=100 err="execution failed: boom"
//! [run-cancelled] reason="deadline exceeded"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn task(e: &Event) -> String {
    e.task.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn reason(e: &Event) -> &str {
    e.reason.as_deref().unwrap_or("")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskStarting => {
                println!("[starting] task={} worker={:?}", task(e), e.worker);
            }
            EventKind::TaskCompleted => println!("[completed] task={}", task(e)),
            EventKind::TaskFailed => {
                println!("[failed] task={} err={:?}", task(e), reason(e));
            }
            EventKind::TimeoutHit => {
                println!("[timeout] task={} timeout_ms={:?}", task(e), e.timeout_ms);
            }
            EventKind::AdmissionRefused => {
                println!("[admission-refused] task={} reason={:?}", task(e), reason(e));
            }
            EventKind::ResultDropped => println!("[result-dropped] task={}", task(e)),
            EventKind::WorkerStarted => println!("[worker-started] worker={:?}", e.worker),
            EventKind::WorkerExited => {
                println!("[worker-exited] worker={:?} reason={:?}", e.worker, reason(e));
            }
            EventKind::InputClosed => println!("[input-closed]"),
            EventKind::RunCompleted => println!("[run-completed] {}", reason(e)),
            EventKind::RunCancelled => println!("[run-cancelled] reason={:?}", reason(e)),
            EventKind::RetryScheduled => {
                println!(
                    "[retry-scheduled] attempt={:?} delay_ms={:?} err={:?}",
                    e.attempt,
                    e.delay_ms,
                    reason(e)
                );
            }
            EventKind::RetrySucceeded => println!("[retry-succeeded] attempt={:?}", e.attempt),
            EventKind::RetryAborted => {
                println!("[retry-aborted] attempt={:?} reason={:?}", e.attempt, reason(e));
            }
            EventKind::RetryExhausted => {
                println!("[retry-exhausted] attempt={:?} err={:?}", e.attempt, reason(e));
            }
            EventKind::RetryRejected => {
                println!("[retry-rejected] attempt={:?} err={:?}", e.attempt, reason(e));
            }
            EventKind::SubscriberOverflow => println!("[subscriber-overflow] {}", reason(e)),
            EventKind::SubscriberPanicked => println!("[subscriber-panicked] {}", reason(e)),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
