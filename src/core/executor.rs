//! # Executor: the entry point tying the components together.
//!
//! ```text
//!                ┌──────────────── Executor ────────────────┐
//!                │ Config · Bus · Option<AdmissionGate>     │
//!                └──┬──────────────┬──────────────┬─────────┘
//!                   ▼              ▼              ▼
//!             fan_out(tasks)   pool::<T>()     retry()
//!             (exact count)    (N workers)     (decorator)
//!                   │              │              │
//!                   └──── publish(Event) ─────────┘
//!                                  ▼
//!                       Bus ──► listener ──► SubscriberSet
//! ```
//!
//! Each run takes an explicit [`Cancellation`]; [`Executor::cancellation`] builds one from
//! the configured default deadline. The executor itself never cancels runs.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{Config, Executor, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let exec = Executor::new(Config { max_concurrent: 2, ..Config::default() });
//!
//!     let tasks: Vec<TaskRef<u64>> = (0..5)
//!         .map(|i| {
//!             TaskFn::arc(i, move |_ctx: CancellationToken| async move {
//!                 Ok::<u64, TaskError>(i * i)
//!             }) as TaskRef<u64>
//!         })
//!         .collect();
//!
//!     let collected = exec.fan_out(tasks, &exec.cancellation()).await;
//!     assert!(collected.is_complete());
//!     assert_eq!(collected.succeeded().count(), 5);
//!
//!     exec.shutdown().await;
//! }
//! ```

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cancel::Cancellation;
use crate::config::Config;
use crate::core::builder::ExecutorBuilder;
use crate::core::collector::{Collected, ResultStream};
use crate::core::pool::{Submitter, start_pool};
use crate::core::runner::RunContext;
use crate::core::{fan_out, runner};
use crate::events::Bus;
use crate::gate::AdmissionGate;
use crate::retry::Retry;
use crate::subscribers::SubscriberSet;
use crate::tasks::{TaskRef, TaskResult};

/// Bounded concurrent task executor.
pub struct Executor {
    cfg: Config,
    bus: Bus,
    gate: Option<AdmissionGate>,
    listener: Option<Listener>,
}

struct Listener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl Executor {
    /// Creates an executor without subscribers.
    pub fn new(cfg: Config) -> Self {
        ExecutorBuilder::new(cfg).build()
    }

    /// Returns a builder for attaching subscribers or a shared gate.
    pub fn builder(cfg: Config) -> ExecutorBuilder {
        ExecutorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        gate: Option<AdmissionGate>,
        subs: Option<SubscriberSet>,
    ) -> Self {
        let listener = subs.map(|set| Listener::spawn(&bus, set));
        Self {
            cfg,
            bus,
            gate,
            listener,
        }
    }

    /// Configuration this executor was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus; subscribe to observe runs directly.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Admission gate shared by every run, if concurrency is limited.
    pub fn gate(&self) -> Option<&AdmissionGate> {
        self.gate.as_ref()
    }

    /// Builds a fresh cancellation signal using the configured default deadline.
    pub fn cancellation(&self) -> Cancellation {
        match self.cfg.run_deadline() {
            Some(deadline) => Cancellation::with_deadline(deadline),
            None => Cancellation::new(),
        }
    }

    /// Runs every task concurrently (under the gate) and collects all results.
    ///
    /// Returns early with partial results if `cancel` fires.
    pub async fn fan_out<T: Send + 'static>(
        &self,
        tasks: Vec<TaskRef<T>>,
        cancel: &Cancellation,
    ) -> Collected<T> {
        self.fan_out_stream(tasks, cancel).collect().await
    }

    /// Like [`fan_out`](Self::fan_out), but yields results as they arrive.
    pub fn fan_out_stream<T: Send + 'static>(
        &self,
        tasks: Vec<TaskRef<T>>,
        cancel: &Cancellation,
    ) -> ResultStream<T> {
        fan_out::fan_out(tasks, &self.run_context(), cancel)
    }

    /// Starts a fixed-size worker pool.
    ///
    /// Feed it through the [`Submitter`] and read the [`ResultStream`] concurrently;
    /// close the submitter after the last task so the stream can end.
    pub fn pool<T: Send + 'static>(
        &self,
        cancel: &Cancellation,
    ) -> (Submitter<T>, ResultStream<T>) {
        start_pool(&self.cfg, &self.run_context(), cancel)
    }

    /// Runs a single task on the calling task, under the gate and timeout.
    ///
    /// Returns `None` if admission was refused because `cancel` fired.
    pub async fn dispatch<T: Send + 'static>(
        &self,
        task: TaskRef<T>,
        cancel: &Cancellation,
    ) -> Option<TaskResult<T>> {
        runner::run_task(task, &self.run_context(), cancel, None).await
    }

    /// Retry controller using the configured policy and this executor's bus.
    pub fn retry(&self) -> Retry {
        Retry::new(self.cfg.retry).with_bus(self.bus.clone())
    }

    /// Stops forwarding events and waits for subscribers to drain their queues.
    ///
    /// Runs still in flight keep going; only event delivery stops.
    pub async fn shutdown(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop.cancel();
            let _ = listener.handle.await;
        }
    }

    fn run_context(&self) -> RunContext {
        RunContext {
            gate: self.gate.clone(),
            timeout: self.cfg.task_timeout(),
            bus: self.bus.clone(),
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.stop.cancel();
        }
    }
}

impl Listener {
    /// Subscribes before spawning, so no event published after `build()` is missed.
    fn spawn(bus: &Bus, set: SubscriberSet) -> Self {
        let mut rx = bus.subscribe();
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(&ev);
            }
            set.shutdown().await;
        });

        Self { stop, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::events::{Event, EventKind};
    use crate::subscribers::Subscribe;
    use crate::tasks::{TaskFn, TaskId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn subscribers_see_run_events() {
        let rec = Arc::new(Recorder::default());
        let exec = Executor::builder(Config::default())
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        let task: TaskRef<u32> = TaskFn::arc(7, |_ctx: CancellationToken| async {
            Ok::<u32, TaskError>(1)
        });
        let collected = exec.fan_out(vec![task], &exec.cancellation()).await;
        assert_eq!(collected.results[0].id, TaskId(7));
        exec.shutdown().await;

        let kinds = rec.0.lock().unwrap().clone();
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskStarting,
                EventKind::TaskCompleted,
                EventKind::RunCompleted
            ]
        );
    }

    #[derive(Default)]
    struct AlwaysPanics(AtomicUsize);

    #[async_trait]
    impl Subscribe for AlwaysPanics {
        async fn on_event(&self, _ev: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
            panic!("always");
        }
        fn name(&self) -> &'static str {
            "always_panics"
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_settles() {
        let sub = Arc::new(AlwaysPanics::default());
        let exec = Executor::builder(Config::default())
            .with_subscribers(vec![sub.clone() as Arc<dyn Subscribe>])
            .build();

        let task: TaskRef<u32> = TaskFn::arc(1, |_ctx: CancellationToken| async {
            Ok::<u32, TaskError>(1)
        });
        let collected = exec.fan_out(vec![task], &exec.cancellation()).await;
        assert!(collected.is_complete());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let first = sub.0.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = sub.0.load(Ordering::SeqCst);
        exec.shutdown().await;

        // Three run events plus one fault event for each of them.
        assert_eq!(first, 6);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn gate_follows_config() {
        let unlimited = Executor::new(Config::default());
        assert!(unlimited.gate().is_none());

        let limited = Executor::new(Config {
            max_concurrent: 4,
            ..Config::default()
        });
        assert_eq!(limited.gate().map(AdmissionGate::capacity), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn default_deadline_applies_to_cancellation() {
        let exec = Executor::new(Config {
            deadline: Duration::from_millis(30),
            ..Config::default()
        });
        let cancel = exec.cancellation();
        assert!(cancel.deadline().is_some());
        cancel.cancelled().await;
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn configured_timeout_reaches_tasks() {
        let exec = Executor::new(Config {
            timeout: Duration::from_millis(10),
            ..Config::default()
        });
        let task: TaskRef<()> = TaskFn::arc(1, |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        });

        let result = exec.dispatch(task, &Cancellation::new()).await.unwrap();
        assert!(matches!(result.outcome, Err(TaskError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_uses_configured_policy() {
        let exec = Executor::new(Config {
            retry: crate::retry::RetryPolicy::fixed(Duration::from_millis(5)).with_max_attempts(2),
            ..Config::default()
        });
        let outcome = exec
            .retry()
            .run(&Cancellation::new(), |_ctx| async { Err::<(), _>("down") })
            .await;
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(outcome.as_label(), "retry_exhausted");
    }
}
