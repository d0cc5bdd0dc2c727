//! # Runtime events emitted by workers, collectors and retry loops.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Task events**: one unit of work moving through admission and execution
//! - **Pool events**: worker lifecycle and input queue closing
//! - **Run events**: how a collection run ended
//! - **Retry events**: the retry controller's state transitions
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskgate::{Event, EventKind, TaskId};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task(TaskId(3))
//!     .with_reason("boom")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task, Some(TaskId(3)));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// Task holds a permit (if gated) and is about to run.
    ///
    /// Sets: `task`, `worker` (pool mode only)
    TaskStarting,

    /// Task returned a value.
    ///
    /// Sets: `task`
    TaskCompleted,

    /// Task returned an error, timed out or panicked.
    ///
    /// Sets: `task`, `reason`
    TaskFailed,

    /// Task exceeded its per-attempt timeout (always followed by `TaskFailed`).
    ///
    /// Sets: `task`, `timeout_ms`
    TimeoutHit,

    /// Task never ran: cancellation fired (or the gate closed) while waiting for a permit.
    ///
    /// Sets: `task`, `reason`
    AdmissionRefused,

    /// A finished task's result was discarded by the `Drop` overflow policy.
    ///
    /// Sets: `task`
    ResultDropped,

    // === Pool events ===
    /// Pool worker started pulling from the input queue.
    ///
    /// Sets: `worker`
    WorkerStarted,

    /// Pool worker exited (input drained after close, or cancellation).
    ///
    /// Sets: `worker`, `reason` (cancellation only)
    WorkerExited,

    /// Submitter closed the input queue; no more tasks will be accepted.
    InputClosed,

    // === Run events ===
    /// Collector received everything it expected.
    ///
    /// Sets: `reason` (counts summary)
    RunCompleted,

    /// Collector stopped early because cancellation fired.
    ///
    /// Sets: `reason`
    RunCancelled,

    // === Retry events ===
    /// Attempt failed; next attempt scheduled after a delay.
    ///
    /// Sets: `attempt` (failed attempt), `delay_ms`, `reason` (last failure)
    RetryScheduled,

    /// Operation succeeded.
    ///
    /// Sets: `attempt`
    RetrySucceeded,

    /// Retry loop stopped because cancellation fired.
    ///
    /// Sets: `attempt`, `reason`
    RetryAborted,

    /// Retry loop gave up after the configured maximum attempts.
    ///
    /// Sets: `attempt`, `reason` (last failure)
    RetryExhausted,

    /// Retry loop stopped on an error the caller classified as not retryable.
    ///
    /// Sets: `attempt`, `reason` (the error)
    RetryRejected,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` ("subscriber=<name> reason=<full|closed>")
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` ("subscriber=<name> panic=<info>")
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task the event is about.
    pub task: Option<TaskId>,
    /// Pool worker index.
    pub worker: Option<usize>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Task timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, cancellation, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            worker: None,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, id: TaskId) -> Self {
        self.task = Some(id);
        self
    }

    /// Attaches a pool worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a timeout (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: &str) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate_to_u32_millis() {
        let ev = Event::new(EventKind::RetryScheduled)
            .with_delay(Duration::from_secs(u64::MAX / 4))
            .with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
        assert_eq!(ev.timeout_ms, Some(1500));
    }

    #[test]
    fn subscriber_events_name_the_subscriber() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
