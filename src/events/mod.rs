//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to publish
//! lifecycle events from the runner, pool workers, collector and retry controller.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::runner`, `core::pool` workers, `ResultSink` (drops),
//!   `ResultStream` (run end), `Retry`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the executor's listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
