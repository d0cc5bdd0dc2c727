//! Cooperative cancellation: deadlines, manual triggers and OS signals.
//!
//! ## Contents
//! - [`Cancellation`] write-once cancellation signal shared by every waiter of a run
//! - [`CancelReason`] why the signal fired (deadline, explicit request, shutdown)
//!
//! ## Quick wiring
//! ```text
//! Cancellation::with_deadline(d) ──┬─► AdmissionGate::acquire(&cancel)   (select arm)
//!                                  ├─► Submitter::submit(task)           (select arm)
//!                                  ├─► ResultStream::next()              (select arm)
//!                                  ├─► Retry::run(&cancel, op)           (select arm)
//!                                  └─► cancel.token() ─► Task::run(ctx)  (cooperative)
//! ```

mod shutdown;
mod signal;

pub use signal::{CancelReason, Cancellation};
