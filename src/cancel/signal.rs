//! # Write-once cancellation signal.
//!
//! [`Cancellation`] wraps a [`CancellationToken`] with a fixed [`CancelReason`] and an
//! optional deadline. Every clone observes the same signal.
//!
//! ## Rules
//! - **Write-once**: the first firing wins; the reason never changes afterwards.
//! - **Idempotent**: concurrent `cancel()` calls and a racing deadline produce one firing.
//! - **Never reset**: once fired, `is_cancelled()` stays `true` for every holder.
//! - **Non-blocking cleanup**: dropping the last handle aborts the deadline timer
//!   (it is never awaited) and stops any shutdown signal listener.
//!
//! ## Firing paths
//! ```text
//! cancel()                    ─┐
//! deadline timer (sleep_until) ─┼─► reason.set(r) (first wins) ─► token.cancel()
//! shutdown signal listener    ─┘
//! ```
//!
//! The reason is stored **before** the token is cancelled, so any waiter woken by the
//! token always finds a reason.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Why a [`Cancellation`] fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The configured deadline elapsed.
    DeadlineExceeded,
    /// [`Cancellation::cancel`] was called.
    Requested,
    /// A process termination signal was received.
    Shutdown,
}

impl CancelReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CancelReason::DeadlineExceeded => "deadline_exceeded",
            CancelReason::Requested => "cancel_requested",
            CancelReason::Shutdown => "shutdown_signal",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
            CancelReason::Requested => f.write_str("cancel requested"),
            CancelReason::Shutdown => f.write_str("shutdown signal"),
        }
    }
}

/// State shared by every clone and by the deadline timer.
#[derive(Debug)]
pub(super) struct Signal {
    token: CancellationToken,
    reason: OnceLock<CancelReason>,
    deadline: Option<Instant>,
    /// Cancelled when the last strong reference goes away.
    released: CancellationToken,
}

impl Signal {
    fn new(deadline: Option<Instant>) -> Self {
        Self {
            token: CancellationToken::new(),
            reason: OnceLock::new(),
            deadline,
            released: CancellationToken::new(),
        }
    }

    /// Fires the signal; returns `true` only for the call that set the reason.
    pub(super) fn fire(&self, reason: CancelReason) -> bool {
        let won = self.reason.set(reason).is_ok();
        self.token.cancel();
        won
    }

    /// Fires with `DeadlineExceeded` if the deadline has already passed.
    fn check_deadline(&self) {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            self.fire(CancelReason::DeadlineExceeded);
        }
    }

    fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    pub(super) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(super) fn released(&self) -> &CancellationToken {
        &self.released
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        self.released.cancel();
    }
}

/// Aborts the deadline timer when the last [`Cancellation`] handle goes away.
#[derive(Debug)]
struct TimerGuard(AbortHandle);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Shared cancellation signal with an optional deadline.
///
/// Cheap to clone; all clones observe the same firing.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use taskgate::{CancelReason, Cancellation};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let cancel = Cancellation::with_deadline(Duration::from_millis(10));
///     let other = cancel.clone();
///
///     assert_eq!(other.cancelled().await, CancelReason::DeadlineExceeded);
///     assert!(!cancel.cancel()); // already fired; reason stays the same
///     assert_eq!(cancel.reason(), Some(CancelReason::DeadlineExceeded));
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Cancellation {
    signal: Arc<Signal>,
    _timer: Option<Arc<TimerGuard>>,
}

impl Cancellation {
    /// Creates a signal that fires only on an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self {
            signal: Arc::new(Signal::new(None)),
            _timer: None,
        }
    }

    /// Creates a signal that fires `timeout` from now (or earlier on explicit cancel).
    ///
    /// Must be called within a Tokio runtime: the deadline is driven by a spawned timer.
    pub fn with_deadline(timeout: Duration) -> Self {
        Self::with_deadline_at(Instant::now() + timeout)
    }

    /// Creates a signal that fires at `deadline` (or earlier on explicit cancel).
    ///
    /// Must be called within a Tokio runtime: the deadline is driven by a spawned timer.
    pub fn with_deadline_at(deadline: Instant) -> Self {
        let signal = Arc::new(Signal::new(Some(deadline)));

        let timer_signal = Arc::clone(&signal);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline) => {
                    timer_signal.fire(CancelReason::DeadlineExceeded);
                }
                _ = timer_signal.token.cancelled() => {}
            }
        });

        Self {
            signal,
            _timer: Some(Arc::new(TimerGuard(handle.abort_handle()))),
        }
    }

    /// Fires the signal with [`CancelReason::Requested`].
    ///
    /// Returns `true` if this call fired the signal, `false` if it had already fired.
    pub fn cancel(&self) -> bool {
        self.signal.fire(CancelReason::Requested)
    }

    /// Non-blocking check whether the signal has fired.
    ///
    /// An elapsed deadline counts as fired even if the timer task has not run yet.
    pub fn is_cancelled(&self) -> bool {
        self.signal.check_deadline();
        self.signal.token.is_cancelled()
    }

    /// Returns the reason, once fired.
    pub fn reason(&self) -> Option<CancelReason> {
        self.signal.check_deadline();
        self.signal.reason()
    }

    /// Waits until the signal fires and returns the reason.
    ///
    /// Cancel-safe; intended as one arm of a `tokio::select!`.
    pub async fn cancelled(&self) -> CancelReason {
        self.signal.token.cancelled().await;
        self.signal.reason().unwrap_or(CancelReason::Requested)
    }

    /// Returns a child token for cooperative work.
    ///
    /// The child is cancelled when this signal fires; cancelling the child
    /// does not fire the signal.
    pub fn token(&self) -> CancellationToken {
        self.signal.token.child_token()
    }

    /// Returns the configured deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.signal.deadline
    }

    pub(super) fn signal(&self) -> &Arc<Signal> {
        &self.signal
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}
