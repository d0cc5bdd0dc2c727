use std::sync::Arc;

use crate::{
    config::Config,
    events::Bus,
    gate::AdmissionGate,
    subscribers::{Subscribe, SubscriberSet},
};

use super::executor::Executor;

/// Builder for constructing an [`Executor`] with optional features.
pub struct ExecutorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    gate: Option<AdmissionGate>,
}

impl ExecutorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            gate: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (task lifecycle, drops, retries, run endings)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an existing gate instead of creating one from `max_concurrent`.
    ///
    /// Lets several executors (or hand-written code) share one permit pool.
    pub fn with_gate(mut self, gate: AdmissionGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Builds the executor.
    ///
    /// Spawns the subscriber workers and the event listener when subscribers are set,
    /// so it must then be called inside a Tokio runtime.
    pub fn build(self) -> Executor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let gate = self
            .gate
            .or_else(|| self.cfg.concurrency_limit().map(AdmissionGate::new));

        let subs = if self.subscribers.is_empty() {
            None
        } else {
            Some(SubscriberSet::new(self.subscribers, bus.clone()))
        };

        Executor::new_internal(self.cfg, bus, gate, subs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_gate_wins_over_config() {
        let shared = AdmissionGate::new(2);
        let exec = ExecutorBuilder::new(Config {
            max_concurrent: 8,
            ..Config::default()
        })
        .with_gate(shared.clone())
        .build();

        assert_eq!(exec.gate().map(AdmissionGate::capacity), Some(2));
        let _held = shared.try_acquire();
        assert_eq!(exec.gate().map(AdmissionGate::available), Some(1));
    }
}
