//! # Example: retry_with_deadline
//!
//! Wraps a flaky operation in the retry controller twice: once where it recovers on
//! the third attempt, once where the backend never recovers and the run deadline
//! cuts the loop short in the middle of a wait.
//!
//! ## Flow
//! ```text
//! Retry::run(cancel, op)
//!   ├─► attempt 1 → Err ─► RetryScheduled(delay=100ms) ─► wait ⟂ cancel
//!   ├─► attempt 2 → Err ─► RetryScheduled(delay≈200ms) ─► wait ⟂ cancel
//!   └─► attempt 3 → Ok  ─► RetrySucceeded ─► Done { attempts: 3 }
//!
//! deadline fires during a wait ─► RetryAborted ─► Aborted { reason: DeadlineExceeded }
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_with_deadline --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskgate::{
    BackoffPolicy, Cancellation, Config, Executor, JitterPolicy, Retry, RetryOutcome, RetryPolicy,
};

/// Pretends to call a backend that fails until `healthy_after` calls have been made.
async fn call_backend(calls: &AtomicU32, healthy_after: u32) -> Result<String, String> {
    let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
    tokio::time::sleep(Duration::from_millis(20)).await;
    if n >= healthy_after {
        Ok(format!("payload from call #{n}"))
    } else {
        Err(format!("503 on call #{n}"))
    }
}

fn describe(outcome: &RetryOutcome<String, String>) -> String {
    match outcome {
        RetryOutcome::Done { value, attempts } => format!("done after {attempts}: {value}"),
        RetryOutcome::Aborted {
            reason,
            last_error,
            attempts,
        } => format!("aborted after {attempts} ({reason}), last error: {last_error:?}"),
        RetryOutcome::Exhausted {
            last_error,
            attempts,
        } => format!("gave up after {attempts}, last error: {last_error}"),
        RetryOutcome::Rejected { error, attempts } => {
            format!("rejected after {attempts}: {error}")
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let backoff = BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(1))
        .with_jitter(JitterPolicy::Equal);
    let cfg = Config {
        retry: RetryPolicy::default().with_backoff(backoff),
        deadline: Duration::from_millis(900),
        ..Config::default()
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn taskgate::Subscribe>> = vec![Arc::new(taskgate::LogWriter::new())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();
    let exec = Executor::builder(cfg).with_subscribers(subs).build();

    // 1. Recovers on the third call.
    let calls = Arc::new(AtomicU32::new(0));
    let outcome = exec
        .retry()
        .run(&exec.cancellation(), |_ctx| {
            let calls = Arc::clone(&calls);
            async move { call_backend(&calls, 3).await }
        })
        .await;
    println!("flaky backend:  {}", describe(&outcome));
    anyhow::ensure!(outcome.is_done(), "expected recovery");

    // 2. Never recovers; the 900ms deadline wins.
    let calls = Arc::new(AtomicU32::new(0));
    let outcome = exec
        .retry()
        .run(&exec.cancellation(), |_ctx| {
            let calls = Arc::clone(&calls);
            async move { call_backend(&calls, u32::MAX).await }
        })
        .await;
    println!("broken backend: {}", describe(&outcome));

    // 3. A hard cap instead of a deadline.
    let calls = Arc::new(AtomicU32::new(0));
    let outcome = Retry::new(RetryPolicy::fixed(Duration::from_millis(10)).with_max_attempts(4))
        .run(&Cancellation::new(), |_ctx| {
            let calls = Arc::clone(&calls);
            async move { call_backend(&calls, u32::MAX).await }
        })
        .await;
    println!("capped retries: {}", describe(&outcome));

    exec.shutdown().await;
    Ok(())
}
