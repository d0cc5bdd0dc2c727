//! Event subscribers.
//!
//! Subscribers are the observability surface of the runtime: every lifecycle event
//! published on the [`Bus`](crate::Bus) is fanned out to them without blocking workers.
//!
//! ```text
//! Bus ──► executor listener ──► SubscriberSet::emit(&Event)
//!                                   ├──► [queue] ─► worker ─► LogWriter::on_event
//!                                   └──► [queue] ─► worker ─► Custom::on_event
//! ```
//!
//! - [`Subscribe`]: trait for custom handlers
//! - [`SubscriberSet`]: per-subscriber bounded queues, panic isolation
//! - `LogWriter` (feature `logging`): prints one line per event

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
