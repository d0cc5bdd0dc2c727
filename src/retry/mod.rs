//! Retry controller: a cancellation-aware decorator around one fallible operation.
//!
//! ## State machine
//! ```text
//! Attempting ──ok──► Done
//!     │
//!     └─err─► CheckingCancellation ──fired──► Aborted
//!                   │
//!                   ├─ not retryable ──► Rejected
//!                   │
//!                   ├─ attempts == max ──► Exhausted
//!                   │
//!                   └─► Waiting (sleep ∥ cancelled) ──fired──► Aborted
//!                             │
//!                             └─ delay elapsed ──► Attempting
//! ```
//!
//! ## Contents
//! - [`RetryPolicy`] inter-attempt delay and optional attempt cap
//! - [`Retry`] the controller; publishes `Retry*` events when given a bus
//! - [`RetryOutcome`] `Done` / `Aborted` / `Exhausted` / `Rejected`

mod controller;
mod outcome;
mod policy;

pub use controller::Retry;
pub use outcome::RetryOutcome;
pub use policy::RetryPolicy;
