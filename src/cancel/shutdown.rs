//! # Cross-platform OS signal trigger.
//!
//! Lets a [`Cancellation`] fire with [`CancelReason::Shutdown`] when the process
//! receives a termination signal.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::signal::{CancelReason, Cancellation};

impl Cancellation {
    /// Spawns a listener that fires this signal with [`CancelReason::Shutdown`]
    /// on the first termination signal.
    ///
    /// The listener exits on its own once the signal fires for any other reason, or
    /// once every handle to this signal has been dropped. It does not keep the signal
    /// alive. If signal registration fails the listener exits without firing.
    pub fn cancel_on_shutdown_signal(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(self.signal());
        let fired = self.signal().token().clone();
        let released = self.signal().released().clone();
        tokio::spawn(async move {
            tokio::select! {
                res = wait_for_shutdown_signal() => {
                    if res.is_ok()
                        && let Some(signal) = weak.upgrade()
                    {
                        signal.fire(CancelReason::Shutdown);
                    }
                }
                _ = fired.cancelled() => {}
                _ = released.cancelled() => {}
            }
        })
    }
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when Ctrl-C is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_exits_after_manual_cancel() {
        let cancel = Cancellation::new();
        let listener = cancel.cancel_on_shutdown_signal();

        cancel.cancel();
        listener.await.unwrap();
        assert_eq!(cancel.reason(), Some(CancelReason::Requested));
    }

    #[tokio::test]
    async fn listener_exits_when_every_handle_is_dropped() {
        let cancel = Cancellation::new();
        let other = cancel.clone();
        let listener = cancel.cancel_on_shutdown_signal();

        drop(cancel);
        assert!(!listener.is_finished());
        drop(other);

        tokio::time::timeout(std::time::Duration::from_secs(1), listener)
            .await
            .expect("listener should stop once the signal is gone")
            .unwrap();
    }
}
