//! # Result channel and collector.
//!
//! [`result_channel`] creates a bounded conduit between producers ([`ResultSink`]) and a
//! single consumer ([`ResultStream`]).
//!
//! ```text
//! worker ──► ResultSink::offer   (never waits; Full → Dropped, counted)
//! worker ──► ResultSink::deliver (Block: waits for room OR cancellation)
//!                 │
//!                 ▼
//!        [bounded mpsc buffer]
//!                 │
//!                 ▼
//!          ResultStream::next ──► Some(result) ... None
//! ```
//!
//! ## Termination
//! The stream ends exactly once, with a [`RunStatus`]:
//! - **expected count reached** (received + dropped) → `Completed`
//! - **every sink dropped** → `Completed`
//! - **cancellation fired** → the buffer is closed, already-buffered results are still
//!   yielded, then the stream ends with `Cancelled(reason)` (or `Completed` if the
//!   drained results happened to reach the expected count).
//!
//! After cancellation no producer can get a new item in: the receiver is closed, so a
//! late `offer`/`deliver` reports [`Offer::Closed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::{self, Stream};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::cancel::{CancelReason, Cancellation};
use crate::events::{Bus, Event, EventKind};
use crate::policies::OverflowPolicy;
use crate::tasks::TaskResult;

/// What happened to a result handed to a [`ResultSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Offer {
    /// Placed in the buffer.
    Accepted,
    /// Buffer was full; discarded and counted.
    Dropped,
    /// The consumer is gone (stream dropped or closed after cancellation).
    Closed,
    /// Cancellation fired while waiting for room (blocking delivery only).
    Cancelled,
}

/// How a collection run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything expected arrived (or all producers finished).
    Completed,
    /// Cancellation stopped the run early; results may be partial.
    Cancelled(CancelReason),
}

impl RunStatus {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunStatus::Completed => "run_completed",
            RunStatus::Cancelled(_) => "run_cancelled",
        }
    }

    /// True if the run was cut short by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunStatus::Cancelled(_))
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    /// Results in arrival order.
    pub results: Vec<TaskResult<T>>,
    /// Results discarded by the `Drop` overflow policy.
    pub dropped: u64,
    /// How the run ended.
    pub status: RunStatus,
}

impl<T> Collected<T> {
    /// True if the run was not cancelled.
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Results whose task succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &TaskResult<T>> {
        self.results.iter().filter(|r| r.is_ok())
    }

    /// Results whose task failed (error, timeout or panic).
    pub fn failed(&self) -> impl Iterator<Item = &TaskResult<T>> {
        self.results.iter().filter(|r| !r.is_ok())
    }
}

/// Creates a result channel.
///
/// - `capacity` is clamped to a minimum of 1.
/// - `overflow` decides what [`ResultSink::deliver`] does on a full buffer.
/// - `expected` ends the stream once that many results were received or dropped;
///   `None` waits until every sink is dropped.
pub fn result_channel<T>(
    capacity: usize,
    overflow: OverflowPolicy,
    bus: Bus,
    cancel: Cancellation,
    expected: Option<usize>,
) -> (ResultSink<T>, ResultStream<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));

    let sink = ResultSink {
        tx,
        overflow,
        dropped: Arc::clone(&dropped),
        bus: bus.clone(),
    };
    let stream = ResultStream {
        rx,
        cancel,
        expected,
        received: 0,
        dropped,
        state: State::Running,
        bus,
    };
    (sink, stream)
}

/// Producer half of a result channel. Cheap to clone.
pub struct ResultSink<T> {
    tx: mpsc::Sender<TaskResult<T>>,
    overflow: OverflowPolicy,
    dropped: Arc<AtomicU64>,
    bus: Bus,
}

impl<T> Clone for ResultSink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            overflow: self.overflow,
            dropped: Arc::clone(&self.dropped),
            bus: self.bus.clone(),
        }
    }
}

impl<T> ResultSink<T> {
    /// Non-blocking publish: a full buffer drops the result and bumps the counter.
    pub fn offer(&self, result: TaskResult<T>) -> Offer {
        let id = result.id;
        match self.tx.try_send(result) {
            Ok(()) => Offer::Accepted,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.bus
                    .publish(Event::new(EventKind::ResultDropped).with_task(id));
                Offer::Dropped
            }
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Publishes according to the sink's [`OverflowPolicy`].
    ///
    /// `Block` waits for room, giving up when `cancel` fires; `Drop` is [`offer`](Self::offer).
    pub async fn deliver(&self, result: TaskResult<T>, cancel: &Cancellation) -> Offer {
        match self.overflow {
            OverflowPolicy::Drop => self.offer(result),
            OverflowPolicy::Block => {
                tokio::select! {
                    biased;
                    res = self.tx.send(result) => match res {
                        Ok(()) => Offer::Accepted,
                        Err(_closed) => Offer::Closed,
                    },
                    _ = cancel.cancelled() => Offer::Cancelled,
                }
            }
        }
    }

    /// Results dropped so far through any clone of this sink.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The overflow policy applied by [`deliver`](Self::deliver).
    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Running,
    Draining(CancelReason),
    Finished(RunStatus),
}

enum Next<T> {
    Item(Option<TaskResult<T>>),
    Cancelled(CancelReason),
}

/// Consumer half of a result channel: a finite, non-restartable sequence of results.
pub struct ResultStream<T> {
    rx: mpsc::Receiver<TaskResult<T>>,
    cancel: Cancellation,
    expected: Option<usize>,
    received: usize,
    dropped: Arc<AtomicU64>,
    state: State,
    bus: Bus,
}

impl<T> ResultStream<T> {
    /// Waits for the next result; `None` once the run has ended.
    pub async fn next(&mut self) -> Option<TaskResult<T>> {
        match self.state {
            State::Finished(_) => return None,
            State::Draining(reason) => return self.drain(reason),
            State::Running => {}
        }

        if self.expected_reached() {
            self.finish(RunStatus::Completed);
            return None;
        }

        let next = tokio::select! {
            biased;
            reason = self.cancel.cancelled() => Next::Cancelled(reason),
            item = self.rx.recv() => Next::Item(item),
        };

        match next {
            Next::Item(Some(result)) => {
                self.received += 1;
                Some(result)
            }
            Next::Item(None) => {
                self.finish(RunStatus::Completed);
                None
            }
            Next::Cancelled(reason) => {
                self.rx.close();
                self.state = State::Draining(reason);
                self.drain(reason)
            }
        }
    }

    /// Drains the stream into a [`Collected`].
    pub async fn collect(mut self) -> Collected<T> {
        let mut results = Vec::new();
        while let Some(result) = self.next().await {
            results.push(result);
        }
        Collected {
            results,
            dropped: self.dropped(),
            status: self.status().unwrap_or(RunStatus::Completed),
        }
    }

    /// Adapts this into a [`futures::Stream`], for use with `StreamExt` combinators.
    ///
    /// Termination rules are unchanged; the final [`RunStatus`] is still published on
    /// the bus but can no longer be queried.
    pub fn into_stream(self) -> impl Stream<Item = TaskResult<T>> {
        stream::unfold(self, |mut results| async move {
            results.next().await.map(|result| (result, results))
        })
    }

    /// Results dropped so far by the producers.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Results yielded so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// How the run ended, or `None` while it is still going.
    pub fn status(&self) -> Option<RunStatus> {
        match self.state {
            State::Finished(status) => Some(status),
            State::Running | State::Draining(_) => None,
        }
    }

    fn drain(&mut self, reason: CancelReason) -> Option<TaskResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.received += 1;
                Some(result)
            }
            Err(_) => {
                let status = if self.expected_reached() {
                    RunStatus::Completed
                } else {
                    RunStatus::Cancelled(reason)
                };
                self.finish(status);
                None
            }
        }
    }

    fn expected_reached(&self) -> bool {
        let seen = self.received as u64 + self.dropped();
        self.expected.is_some_and(|n| seen >= n as u64)
    }

    fn finish(&mut self, status: RunStatus) {
        self.state = State::Finished(status);
        let counts = format!("received={} dropped={}", self.received, self.dropped());
        let ev = match status {
            RunStatus::Completed => Event::new(EventKind::RunCompleted).with_reason(counts),
            RunStatus::Cancelled(reason) => {
                Event::new(EventKind::RunCancelled).with_reason(format!("{reason} {counts}"))
            }
        };
        self.bus.publish(ev);
    }
}
