//! Delay and overflow policies.
//!
//! This module groups the knobs that control **how long** the retry controller waits
//! between attempts and **what happens** when a bounded result channel is full.
//!
//! ## Contents
//! - [`BackoffPolicy`] how inter-attempt delays evolve (fixed by default)
//! - [`JitterPolicy`]  randomization applied on top of the delay
//! - [`OverflowPolicy`] block the producer or drop the result when the channel is full
//!
//! ## Quick wiring
//! ```text
//! RetryPolicy { backoff: BackoffPolicy, max_attempts }
//!      └─► retry::Retry uses backoff.delay(retry_index) between attempts
//!
//! Config { result_capacity, overflow: OverflowPolicy }
//!      └─► core::collector::ResultSink::deliver / offer
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → fixed 100ms, no jitter.
//! - `OverflowPolicy::Block` (guaranteed delivery).

mod backoff;
mod jitter;
mod overflow;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use overflow::OverflowPolicy;
