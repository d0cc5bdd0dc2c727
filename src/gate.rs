//! # Admission gate: bounded concurrent execution.
//!
//! [`AdmissionGate`] is a counting permit pool built on [`tokio::sync::Semaphore`].
//! It bounds how many units of work run at once, independent of how many were dispatched.
//!
//! ## Rules
//! - `acquire` is a multi-way wait: permit **or** cancellation, whichever comes first.
//! - Cancellation observed before the call returns `AdmissionError::Cancelled` immediately.
//! - A [`Permit`] is released on drop, on every exit path; release never blocks.
//! - Permits held never exceed [`AdmissionGate::capacity`]. No fairness beyond the
//!   semaphore's own FIFO queue is promised.

use std::sync::Arc;
use std::thread;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::cancel::Cancellation;
use crate::error::AdmissionError;

/// Counting permit pool bounding concurrent execution.
///
/// Cheap to clone; clones share the same permits.
#[derive(Clone, Debug)]
pub struct AdmissionGate {
    sem: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` permits (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sem: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Creates a gate sized to the machine's available parallelism (falls back to 1).
    pub fn from_available_parallelism() -> Self {
        Self::new(available_parallelism())
    }

    /// Waits for a permit or for `cancel` to fire, whichever happens first.
    ///
    /// ### Errors
    /// - [`AdmissionError::Cancelled`] if `cancel` fired before or during the wait
    /// - [`AdmissionError::Closed`] if the gate was closed
    pub async fn acquire(&self, cancel: &Cancellation) -> Result<Permit, AdmissionError> {
        if let Some(reason) = cancel.reason() {
            return Err(AdmissionError::Cancelled(reason));
        }

        let permit_future = Arc::clone(&self.sem).acquire_owned();
        tokio::pin!(permit_future);

        tokio::select! {
            biased;
            reason = cancel.cancelled() => Err(AdmissionError::Cancelled(reason)),
            res = &mut permit_future => match res {
                Ok(inner) => Ok(Permit { inner }),
                Err(_closed) => Err(AdmissionError::Closed),
            },
        }
    }

    /// Takes a permit if one is free right now.
    pub fn try_acquire(&self) -> Option<Permit> {
        match Arc::clone(&self.sem).try_acquire_owned() {
            Ok(inner) => Some(Permit { inner }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Closes the gate: pending and future `acquire` calls fail with `Closed`.
    ///
    /// Permits already held stay valid until dropped.
    pub fn close(&self) {
        self.sem.close();
    }

    /// Configured number of permits.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.sem.available_permits()
    }

    /// Permits currently held.
    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }
}

/// Proof of admission. Returned to the gate when dropped.
#[derive(Debug)]
#[must_use = "dropping a permit releases it immediately"]
pub struct Permit {
    inner: OwnedSemaphorePermit,
}

impl Permit {
    /// Returns the permit to the gate. Equivalent to dropping it.
    pub fn release(self) {
        drop(self.inner);
    }
}

/// Number of CPUs the runtime may use, at least 1.
pub(crate) fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::cancel::CancelReason;

    #[tokio::test]
    async fn acquire_after_cancel_fails_immediately() {
        let gate = AdmissionGate::new(4);
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = gate.acquire(&cancel).await.unwrap_err();
        assert_eq!(err, AdmissionError::Cancelled(CancelReason::Requested));
        assert_eq!(gate.available(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_acquire_returns_on_deadline() {
        let gate = AdmissionGate::new(1);
        let cancel = Cancellation::with_deadline(Duration::from_millis(100));
        let _held = gate.acquire(&cancel).await.unwrap();

        let err = gate.acquire(&cancel).await.unwrap_err();
        assert_eq!(err, AdmissionError::Cancelled(CancelReason::DeadlineExceeded));
        assert_eq!(gate.in_use(), 1);
    }

    #[tokio::test]
    async fn release_returns_permit() {
        let gate = AdmissionGate::new(2);
        let cancel = Cancellation::new();

        let a = gate.acquire(&cancel).await.unwrap();
        let b = gate.acquire(&cancel).await.unwrap();
        assert_eq!(gate.in_use(), 2);
        assert!(gate.try_acquire().is_none());

        a.release();
        assert_eq!(gate.in_use(), 1);
        drop(b);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn closed_gate_refuses_admission() {
        let gate = AdmissionGate::new(1);
        gate.close();
        let err = gate.acquire(&Cancellation::new()).await.unwrap_err();
        assert_eq!(err, AdmissionError::Closed);
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(AdmissionGate::new(0).capacity(), 1);
        assert!(AdmissionGate::from_available_parallelism().capacity() >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn permits_held_never_exceed_capacity() {
        const CAP: usize = 3;
        let gate = AdmissionGate::new(CAP);
        let cancel = Cancellation::new();
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..24 {
            let gate = gate.clone();
            let cancel = cancel.clone();
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let permit = gate.acquire(&cancel).await.unwrap();
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                permit.release();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= CAP);
        assert_eq!(gate.available(), CAP);
    }
}
