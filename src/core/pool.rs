//! # Fixed-worker-pool dispatch.
//!
//! A fixed number of long-lived workers pull tasks from one shared bounded input queue.
//!
//! ```text
//! Submitter ──submit──► [input queue (bounded)] ──► worker 0 ──┐
//!     │                                         ├─► worker 1 ──┼──► ResultSink ──► ResultStream
//!     └──close (once)                           └─► worker N ──┘   (OverflowPolicy)
//! ```
//!
//! ## Rules
//! - Closing the input (dropping or [`Submitter::close`]) is the only "no more tasks" signal,
//!   and it can happen exactly once: the submitter is consumed by it.
//! - Close never discards buffered tasks: workers keep pulling until the queue is empty,
//!   then exit.
//! - Every wait a worker does (next task, permit, full result buffer) races cancellation.
//! - The result stream ends when the last worker exits.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::cancel::{CancelReason, Cancellation};
use crate::config::Config;
use crate::core::collector::{Offer, ResultSink, ResultStream, result_channel};
use crate::core::runner::{RunContext, run_task};
use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskRef;

type SharedInput<T> = Arc<Mutex<mpsc::Receiver<TaskRef<T>>>>;

/// Producer handle for a worker pool.
///
/// Not cloneable. Dropping it (or calling [`close`](Self::close)) closes the input.
pub struct Submitter<T> {
    tx: mpsc::Sender<TaskRef<T>>,
    cancel: Cancellation,
    bus: Bus,
}

impl<T: Send + 'static> Submitter<T> {
    /// Queues `task`, waiting while the input queue is full.
    ///
    /// ### Errors
    /// - [`SubmitError::Cancelled`] if cancellation fired before or during the wait
    /// - [`SubmitError::Closed`] if every worker has exited
    pub async fn submit(&self, task: TaskRef<T>) -> Result<(), SubmitError> {
        if let Some(reason) = self.cancel.reason() {
            return Err(SubmitError::Cancelled(reason));
        }
        tokio::select! {
            biased;
            reason = self.cancel.cancelled() => Err(SubmitError::Cancelled(reason)),
            res = self.tx.send(task) => res.map_err(|_| SubmitError::Closed),
        }
    }

    /// Queues `task` only if there is room right now.
    ///
    /// ### Errors
    /// - [`SubmitError::Cancelled`] if cancellation fired
    /// - [`SubmitError::Full`] if the input queue is full
    /// - [`SubmitError::Closed`] if every worker has exited
    pub fn try_submit(&self, task: TaskRef<T>) -> Result<(), SubmitError> {
        if let Some(reason) = self.cancel.reason() {
            return Err(SubmitError::Cancelled(reason));
        }
        self.tx.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    /// Signals "no more tasks". Already-queued tasks still run.
    pub fn close(self) {
        drop(self);
    }

    /// Free slots in the input queue.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

impl<T> Drop for Submitter<T> {
    fn drop(&mut self) {
        self.bus.publish(Event::new(EventKind::InputClosed));
    }
}

/// Starts the workers and returns the input handle plus the result stream.
pub(crate) fn start_pool<T: Send + 'static>(
    cfg: &Config,
    ctx: &RunContext,
    cancel: &Cancellation,
) -> (Submitter<T>, ResultStream<T>) {
    let (tx, rx) = mpsc::channel::<TaskRef<T>>(cfg.queue_capacity_clamped());
    let input: SharedInput<T> = Arc::new(Mutex::new(rx));
    let (sink, stream) = result_channel(
        cfg.result_capacity_clamped(),
        cfg.overflow,
        ctx.bus.clone(),
        cancel.clone(),
        None,
    );

    for idx in 0..cfg.worker_count() {
        let worker = Worker {
            idx,
            input: Arc::clone(&input),
            ctx: ctx.clone(),
            cancel: cancel.clone(),
            sink: sink.clone(),
        };
        tokio::spawn(worker.run());
    }

    let submitter = Submitter {
        tx,
        cancel: cancel.clone(),
        bus: ctx.bus.clone(),
    };
    (submitter, stream)
}

struct Worker<T> {
    idx: usize,
    input: SharedInput<T>,
    ctx: RunContext,
    cancel: Cancellation,
    sink: ResultSink<T>,
}

enum Exit {
    Drained,
    StreamClosed,
    Cancelled(CancelReason),
}

impl<T: Send + 'static> Worker<T> {
    async fn run(self) {
        self.ctx
            .bus
            .publish(Event::new(EventKind::WorkerStarted).with_worker(self.idx));

        let exit = loop {
            let task = tokio::select! {
                biased;
                reason = self.cancel.cancelled() => break Exit::Cancelled(reason),
                task = self.next_task() => match task {
                    Some(task) => task,
                    None => break Exit::Drained,
                },
            };

            let Some(result) = run_task(task, &self.ctx, &self.cancel, Some(self.idx)).await
            else {
                continue;
            };
            match self.sink.deliver(result, &self.cancel).await {
                Offer::Accepted | Offer::Dropped | Offer::Cancelled => {}
                Offer::Closed => break Exit::StreamClosed,
            }
        };

        let mut ev = Event::new(EventKind::WorkerExited).with_worker(self.idx);
        match exit {
            Exit::Drained => {}
            Exit::StreamClosed => ev = ev.with_reason("result stream closed"),
            Exit::Cancelled(reason) => ev = ev.with_reason(reason.to_string()),
        }
        self.ctx.bus.publish(ev);
    }

    async fn next_task(&self) -> Option<TaskRef<T>> {
        self.input.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collector::RunStatus;
    use crate::error::TaskError;
    use crate::policies::OverflowPolicy;
    use crate::tasks::{TaskFn, TaskId};
    use crate::gate::AdmissionGate;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> RunContext {
        RunContext {
            gate: None,
            timeout: None,
            bus: Bus::new(1024),
        }
    }

    fn instant(id: u64) -> TaskRef<u64> {
        TaskFn::arc(id, move |_ctx: CancellationToken| async move {
            Ok::<u64, TaskError>(id)
        })
    }

    #[tokio::test]
    async fn buffered_tasks_survive_close() {
        let cfg = Config {
            workers: 2,
            queue_capacity: 8,
            result_capacity: 8,
            ..Config::default()
        };
        let (submitter, stream) = start_pool::<u64>(&cfg, &ctx(), &Cancellation::new());

        for id in 0..8 {
            submitter.try_submit(instant(id)).unwrap();
        }
        assert_eq!(submitter.try_submit(instant(99)), Err(SubmitError::Full));
        submitter.close();

        let collected = stream.collect().await;
        assert!(collected.is_complete());
        let ids: HashSet<TaskId> = collected.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, (0..8).map(TaskId).collect());
    }

    #[tokio::test]
    async fn submit_waits_for_room_while_workers_drain() {
        let cfg = Config {
            workers: 3,
            ..Config::default()
        };
        let (submitter, stream) = start_pool::<u64>(&cfg, &ctx(), &Cancellation::new());

        let producer = tokio::spawn(async move {
            for id in 0..40 {
                submitter.submit(instant(id)).await?;
            }
            submitter.close();
            Ok::<(), SubmitError>(())
        });

        let collected = stream.collect().await;
        producer.await.unwrap().unwrap();
        assert_eq!(collected.results.len(), 40);
        assert_eq!(collected.dropped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_policy_discards_when_nobody_reads() {
        let cfg = Config {
            workers: 2,
            queue_capacity: 6,
            result_capacity: 1,
            overflow: OverflowPolicy::Drop,
            ..Config::default()
        };
        let (submitter, stream) = start_pool::<u64>(&cfg, &ctx(), &Cancellation::new());
        for id in 0..6 {
            submitter.try_submit(instant(id)).unwrap();
        }
        submitter.close();

        // Let the workers finish everything before the consumer shows up.
        time::sleep(Duration::from_millis(100)).await;

        let collected = stream.collect().await;
        assert_eq!(collected.results.len(), 1);
        assert_eq!(collected.dropped, 5);
        assert_eq!(collected.results.len() as u64 + collected.dropped, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_workers_and_submitter() {
        let cfg = Config {
            workers: 2,
            queue_capacity: 4,
            result_capacity: 4,
            ..Config::default()
        };
        let cancel = Cancellation::with_deadline(Duration::from_millis(50));
        let (submitter, stream) = start_pool::<u64>(&cfg, &ctx(), &cancel);

        for id in 0..2 {
            let task: TaskRef<u64> =
                TaskFn::arc(id, move |ctx: CancellationToken| async move {
                    ctx.cancelled().await;
                    Err::<u64, _>(TaskError::Canceled)
                });
            submitter.submit(task).await.unwrap();
        }

        let collected = stream.collect().await;
        assert_eq!(
            collected.status,
            RunStatus::Cancelled(CancelReason::DeadlineExceeded)
        );
        assert_eq!(
            submitter.try_submit(instant(9)),
            Err(SubmitError::Cancelled(CancelReason::DeadlineExceeded))
        );
    }

    #[tokio::test]
    async fn workers_report_lifecycle() {
        let ctx = ctx();
        let mut rx = ctx.bus.subscribe();
        let cfg = Config {
            workers: 1,
            ..Config::default()
        };
        let (submitter, stream) = start_pool::<u64>(&cfg, &ctx, &Cancellation::new());
        submitter.submit(instant(1)).await.unwrap();
        submitter.close();
        stream.collect().await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::WorkerStarted));
        assert!(kinds.contains(&EventKind::InputClosed));
        assert_eq!(kinds.last(), Some(&EventKind::RunCompleted));
        assert!(kinds.contains(&EventKind::WorkerExited));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn workers_share_the_gate() {
        const CAP: usize = 2;
        let gate = AdmissionGate::new(CAP);
        let ctx = RunContext {
            gate: Some(gate.clone()),
            ..ctx()
        };
        let cfg = Config {
            workers: 6,
            queue_capacity: 32,
            result_capacity: 32,
            ..Config::default()
        };
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (submitter, stream) = start_pool::<u64>(&cfg, &ctx, &Cancellation::new());

        for id in 0..24 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let task: TaskRef<u64> = TaskFn::arc(id, move |_ctx: CancellationToken| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<u64, TaskError>(id)
                }
            });
            submitter.submit(task).await.unwrap();
        }
        submitter.close();

        let collected = stream.collect().await;
        assert_eq!(collected.results.len(), 24);
        assert!(peak.load(Ordering::SeqCst) <= CAP);
        assert_eq!(gate.available(), CAP);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn drop_policy_accounts_for_every_task_with_a_live_reader() {
        const TOTAL: u64 = 60;
        let cfg = Config {
            workers: 4,
            queue_capacity: 4,
            result_capacity: 2,
            overflow: OverflowPolicy::Drop,
            ..Config::default()
        };
        let (submitter, mut stream) = start_pool::<u64>(&cfg, &ctx(), &Cancellation::new());

        let producer = tokio::spawn(async move {
            for id in 0..TOTAL {
                submitter.submit(instant(id)).await?;
            }
            submitter.close();
            Ok::<(), SubmitError>(())
        });

        let mut results = Vec::new();
        while let Some(result) = stream.next().await {
            results.push(result);
            time::sleep(Duration::from_millis(1)).await;
        }
        producer.await.unwrap().unwrap();

        assert_eq!(results.len() as u64 + stream.dropped(), TOTAL);
        assert_eq!(stream.received(), results.len());
        assert_eq!(stream.status(), Some(RunStatus::Completed));
    }
}
