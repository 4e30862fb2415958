use std::time::Duration;

use crate::utils::id_generator::IdGenerator;

/// What happens to a superstep when one of its branches fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any branch failure discards the whole step's outputs (no partial
    /// merge) and ends the run with status `Failed`.
    #[default]
    FailFast,
    /// Successful branches merge; failures are recorded on the
    /// [`RunResult`](super::RunResult) and the run continues.
    FailSoft,
}

/// Execution settings for a compiled graph.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Identifier attached to logs and events for this run. Generated when
    /// not supplied.
    pub run_id: Option<String>,
    /// Upper bound on supersteps. A run that would dispatch step
    /// `max_steps + 1` ends with status `MaxStepsExceeded` instead. `None`
    /// means unbounded (cycles then rely on routers reaching `End`).
    pub max_steps: Option<u64>,
    /// Wall-clock budget per node invocation; expiry is a branch failure.
    pub node_timeout: Option<Duration>,
    /// Branch failure handling. See [`FailurePolicy`].
    pub failure_policy: FailurePolicy,
    /// Maximum concurrently running invocations per superstep. Defaults to
    /// `std::thread::available_parallelism()`.
    pub concurrency_limit: Option<usize>,
    /// Event sink wiring for the run.
    pub event_bus: EventBusConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            run_id: Some(IdGenerator::new().generate_run_id()),
            max_steps: None,
            node_timeout: None,
            failure_policy: FailurePolicy::default(),
            concurrency_limit: None,
            event_bus: EventBusConfig::default(),
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    #[must_use]
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }

    #[must_use]
    pub fn with_stdout_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::with_stdout_only())
    }

    #[must_use]
    pub fn with_quiet_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::quiet())
    }
}

/// Sink kinds the runtime can construct on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

/// Event sink wiring for a run's [`EventBus`](crate::event_bus::EventBus).
#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn new(sinks: Vec<SinkConfig>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self::new(vec![SinkConfig::StdOut])
    }

    /// No pre-configured sinks; events still reach receivers returned by
    /// [`invoke_streaming`](crate::app::App::invoke_streaming).
    #[must_use]
    pub fn quiet() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
        self
    }

    #[must_use]
    pub fn sinks(&self) -> &[SinkConfig] {
        &self.sinks
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::with_stdout_only()
    }
}
