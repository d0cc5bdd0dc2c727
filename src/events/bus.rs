//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so that workers can report lifecycle
//! events without ever waiting on observers.
//!
//! ```text
//!   Runner  ──┐
//!   Worker  ──┼──────► Bus ───────► executor listener ────► SubscriberSet
//!   Retry   ──┤  (broadcast chan)
//!   Sink    ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: a full ring buffer overwrites the oldest event.
//! - **Lag**: slow receivers observe `RecvError::Lagged(n)` and skip `n` events.
//! - **No persistence**: events sent while nobody listens are lost.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers; never blocks.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
