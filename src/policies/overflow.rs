//! # Overflow policy for bounded result channels.
//!
//! - [`OverflowPolicy::Block`] the producer waits for room (or for cancellation).
//!   Guaranteed delivery; use when every result matters.
//! - [`OverflowPolicy::Drop`] a publish that would wait is discarded immediately and
//!   counted. Producers never stall; use only when they must not, whatever the
//!   consumer speed.
//!
//! Under several concurrent producers the `Drop` policy makes no promise about
//! *which* result is dropped: whichever `try_send` finds the buffer full loses.

/// What a producer does when the result channel is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait for room; the wait is cancellable.
    #[default]
    Block,
    /// Discard the result and bump the dropped counter.
    Drop,
}

impl OverflowPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::Block => "block",
            OverflowPolicy::Drop => "drop",
        }
    }
}
