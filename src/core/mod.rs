//! Runtime core: dispatch, execution and collection.
//!
//! The public API from this module is [`Executor`] (plus its builder) and the
//! result-channel types it hands out.
//!
//! Internal modules:
//! - [`runner`]: runs one task under the gate with timeout, panic isolation and events;
//! - [`fan_out`]: exact-count mode, one spawned execution per task;
//! - [`pool`]: fixed-worker-pool mode fed by a [`Submitter`];
//! - [`collector`]: result channel, overflow handling and the cancel-aware drain;
//! - [`executor`]: ties configuration, gate, bus and subscribers together.

mod builder;
mod collector;
mod executor;
mod fan_out;
mod pool;
mod runner;

pub use builder::ExecutorBuilder;
pub use collector::{Collected, Offer, ResultSink, ResultStream, RunStatus, result_channel};
pub use executor::Executor;
pub use pool::Submitter;
