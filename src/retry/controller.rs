//! # Retry loop with interruptible waits.
//!
//! ## Rules
//! - Cancellation is checked **before** every attempt and **immediately after** every
//!   failure (covers a deadline that expired during the failing call).
//! - The inter-attempt wait is a `select!` between the delay and cancellation; it is
//!   never a blind sleep. Cancellation mid-wait returns `Aborted` at once.
//! - Attempts run sequentially; the operation receives a child token of the signal.
//! - After a failure, cancellation takes precedence over rejection, and rejection
//!   over exhaustion.

use std::fmt::Display;
use std::future::Future;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::cancel::{CancelReason, Cancellation};
use crate::events::{Bus, Event, EventKind};
use crate::retry::{RetryOutcome, RetryPolicy};

/// Retry controller for a single fallible operation.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use taskgate::{Cancellation, Retry, RetryOutcome, RetryPolicy};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let cancel = Cancellation::with_deadline(Duration::from_secs(1));
///     let mut calls = 0;
///
///     let outcome = Retry::new(RetryPolicy::fixed(Duration::from_millis(5)))
///         .run(&cancel, |_ctx| {
///             calls += 1;
///             let n = calls;
///             async move { if n < 3 { Err("not yet") } else { Ok(n) } }
///         })
///         .await;
///
///     assert_eq!(outcome, RetryOutcome::Done { value: 3, attempts: 3 });
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Retry {
    policy: RetryPolicy,
    bus: Option<Bus>,
}

impl Retry {
    /// Creates a controller with the given policy and no event publishing.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, bus: None }
    }

    /// Publishes `Retry*` events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invokes `op` until it succeeds, the attempt cap is hit, or `cancel` fires.
    ///
    /// Every error is treated as retryable.
    pub async fn run<F, Fut, T, E>(&self, cancel: &Cancellation, op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_while(cancel, |_: &E| true, op).await
    }

    /// Like [`run`](Self::run), but stops with [`RetryOutcome::Rejected`] as soon as
    /// `retryable` returns `false` for an error.
    ///
    /// For task errors pass [`TaskError::is_retryable`](crate::TaskError::is_retryable).
    ///
    /// # Example
    /// ```rust
    /// use taskgate::{Cancellation, Retry, RetryPolicy, TaskError};
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let outcome = Retry::new(RetryPolicy::default())
    ///         .run_while(&Cancellation::new(), TaskError::is_retryable, |_ctx| async {
    ///             Err::<(), _>(TaskError::fatal("bad credentials"))
    ///         })
    ///         .await;
    ///
    ///     assert_eq!(outcome.as_label(), "retry_rejected");
    ///     assert_eq!(outcome.attempts(), 1);
    /// }
    /// ```
    pub async fn run_while<F, Fut, T, E, P>(
        &self,
        cancel: &Cancellation,
        retryable: P,
        mut op: F,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempts: u32 = 0;
        let mut last_error: Option<E> = None;

        loop {
            if let Some(reason) = cancel.reason() {
                return self.aborted(reason, last_error, attempts);
            }

            attempts += 1;
            let err = match op(cancel.token()).await {
                Ok(value) => {
                    self.publish(Event::new(EventKind::RetrySucceeded).with_attempt(attempts));
                    return RetryOutcome::Done { value, attempts };
                }
                Err(err) => err,
            };

            if let Some(reason) = cancel.reason() {
                return self.aborted(reason, Some(err), attempts);
            }
            if !retryable(&err) {
                self.publish(
                    Event::new(EventKind::RetryRejected)
                        .with_attempt(attempts)
                        .with_reason(err.to_string()),
                );
                return RetryOutcome::Rejected {
                    error: err,
                    attempts,
                };
            }
            if self.policy.exhausted(attempts) {
                self.publish(
                    Event::new(EventKind::RetryExhausted)
                        .with_attempt(attempts)
                        .with_reason(err.to_string()),
                );
                return RetryOutcome::Exhausted {
                    last_error: err,
                    attempts,
                };
            }

            let delay = self.policy.backoff.delay(attempts - 1);
            self.publish(
                Event::new(EventKind::RetryScheduled)
                    .with_attempt(attempts)
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );
            last_error = Some(err);

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            tokio::select! {
                biased;
                reason = cancel.cancelled() => {
                    return self.aborted(reason, last_error, attempts);
                }
                _ = &mut sleep => {}
            }
        }
    }

    fn aborted<T, E>(
        &self,
        reason: CancelReason,
        last_error: Option<E>,
        attempts: u32,
    ) -> RetryOutcome<T, E> {
        self.publish(
            Event::new(EventKind::RetryAborted)
                .with_attempt(attempts)
                .with_reason(reason.to_string()),
        );
        RetryOutcome::Aborted {
            reason,
            last_error,
            attempts,
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn always_failing_op_aborts_at_deadline() {
        let deadline = Duration::from_secs(1);
        let interval = Duration::from_millis(100);
        let cancel = Cancellation::with_deadline(deadline);
        let started = Instant::now();

        let outcome = Retry::new(RetryPolicy::fixed(interval))
            .run(&cancel, |_ctx| async { Err::<(), _>("down") })
            .await;

        let elapsed = started.elapsed();
        match outcome {
            RetryOutcome::Aborted {
                reason,
                last_error,
                attempts,
            } => {
                assert_eq!(reason, CancelReason::DeadlineExceeded);
                assert_eq!(last_error, Some("down"));
                assert!((10..=11).contains(&attempts), "attempts={attempts}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(elapsed >= deadline - interval, "{elapsed:?}");
        assert!(elapsed <= deadline + interval, "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_third_attempt_waits_twice() {
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let cancel = Cancellation::new();
        let started = Instant::now();
        let mut calls = 0u32;

        let outcome = Retry::new(RetryPolicy::fixed(Duration::from_millis(50)))
            .with_bus(bus)
            .run(&cancel, |_ctx| {
                calls += 1;
                let n = calls;
                async move { if n == 3 { Ok("up") } else { Err("down") } }
            })
            .await;

        assert_eq!(
            outcome,
            RetryOutcome::Done {
                value: "up",
                attempts: 3
            }
        );
        assert_eq!(started.elapsed(), Duration::from_millis(100));

        let mut scheduled = 0;
        while let Ok(ev) = rx.try_recv() {
            match ev.kind {
                EventKind::RetryScheduled => {
                    scheduled += 1;
                    assert_eq!(ev.delay_ms, Some(50));
                }
                EventKind::RetrySucceeded => assert_eq!(ev.attempt, Some(3)),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(scheduled, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_cap_exhausts() {
        let cancel = Cancellation::new();
        let outcome = Retry::new(RetryPolicy::fixed(Duration::from_millis(10)).with_max_attempts(4))
            .run(&cancel, |_ctx| async { Err::<(), _>("nope") })
            .await;

        assert_eq!(
            outcome,
            RetryOutcome::Exhausted {
                last_error: "nope",
                attempts: 4
            }
        );
        assert_eq!(outcome.as_label(), "retry_exhausted");
    }

    #[tokio::test]
    async fn cancelled_before_first_attempt_never_calls_op() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let mut calls = 0;

        let outcome = Retry::new(RetryPolicy::default())
            .run(&cancel, |_ctx| {
                calls += 1;
                async { Ok::<_, &str>(()) }
            })
            .await;

        assert_eq!(calls, 0);
        assert_eq!(
            outcome,
            RetryOutcome::Aborted {
                reason: CancelReason::Requested,
                last_error: None,
                attempts: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiring_during_failing_call_skips_the_wait() {
        let cancel = Cancellation::with_deadline(Duration::from_millis(100));
        let started = Instant::now();

        let outcome = Retry::new(RetryPolicy::fixed(Duration::from_secs(60)))
            .run(&cancel, |_ctx| async {
                time::sleep(Duration::from_millis(150)).await;
                Err::<(), _>("slow failure")
            })
            .await;

        assert_eq!(outcome.attempts(), 1);
        assert!(matches!(
            outcome,
            RetryOutcome::Aborted {
                reason: CancelReason::DeadlineExceeded,
                last_error: Some("slow failure"),
                ..
            }
        ));
        assert_eq!(started.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_wait_interrupts_delay() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let outcome = Retry::new(RetryPolicy::fixed(Duration::from_secs(10)))
            .run(&cancel, |_ctx| async { Err::<(), _>("down") })
            .await;

        assert_eq!(outcome.attempts(), 1);
        assert!(!outcome.is_done());
        assert_eq!(started.elapsed(), Duration::from_millis(30));
    }

    #[tokio::test]
    async fn operation_receives_a_live_token() {
        let cancel = Cancellation::new();
        let outcome = Retry::new(RetryPolicy::default())
            .run(&cancel, |ctx: CancellationToken| async move {
                if ctx.is_cancelled() { Err("cancelled") } else { Ok(7) }
            })
            .await;
        assert_eq!(outcome.into_value(), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_task_error_stops_retrying() {
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let mut calls = 0u32;

        let outcome = Retry::new(RetryPolicy::fixed(Duration::from_millis(10)))
            .with_bus(bus)
            .run_while(&Cancellation::new(), TaskError::is_retryable, |_ctx| {
                calls += 1;
                let n = calls;
                async move {
                    if n < 3 {
                        Err::<(), _>(TaskError::fail("flaky"))
                    } else {
                        Err(TaskError::fatal("bad credentials"))
                    }
                }
            })
            .await;

        assert_eq!(calls, 3);
        assert_eq!(
            outcome,
            RetryOutcome::Rejected {
                error: TaskError::fatal("bad credentials"),
                attempts: 3
            }
        );
        assert_eq!(outcome.as_label(), "retry_rejected");

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::RetryScheduled,
                EventKind::RetryScheduled,
                EventKind::RetryRejected
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_task_errors_still_hit_the_cap() {
        let outcome = Retry::new(RetryPolicy::fixed(Duration::from_millis(10)).with_max_attempts(3))
            .run_while(&Cancellation::new(), TaskError::is_retryable, |_ctx| async {
                Err::<(), _>(TaskError::Timeout {
                    timeout: Duration::from_millis(1),
                })
            })
            .await;

        assert_eq!(outcome.as_label(), "retry_exhausted");
        assert_eq!(outcome.attempts(), 3);
    }

    #[tokio::test]
    async fn cancellation_wins_over_rejection() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();

        let outcome = Retry::new(RetryPolicy::default())
            .run_while(&cancel, TaskError::is_retryable, |_ctx| {
                trigger.cancel();
                async { Err::<(), _>(TaskError::fatal("nope")) }
            })
            .await;

        assert!(matches!(
            outcome,
            RetryOutcome::Aborted {
                reason: CancelReason::Requested,
                last_error: Some(TaskError::Fatal { .. }),
                attempts: 1
            }
        ));
    }
}
