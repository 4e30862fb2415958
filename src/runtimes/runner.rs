//! The run loop: frontier computation, superstep dispatch, failure policy,
//! and barrier application.
//!
//! A [`Runner`] drives one run of a compiled [`App`](crate::app::App) from
//! the initial frontier (edges out of `Start`, evaluated over the initial
//! snapshot) to a terminal status. Each iteration:
//!
//! 1. observe cancellation (between steps only; in-flight work completes),
//! 2. stop if the frontier is terminal (empty or all `End`),
//! 3. stop with `MaxStepsExceeded` if the step bound is reached,
//! 4. dispatch the frontier as one superstep,
//! 5. apply the failure policy,
//! 6. merge the surviving outputs at the barrier,
//! 7. compute the next frontier from the nodes that ran.
//!
//! Routing to a node the registry does not contain is a hard error: the run
//! terminates with [`RunError::UnknownRouteTarget`] rather than silently
//! dropping the edge.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::app::{App, MergeError};
use crate::cancellation::{CancelSignal, CancelToken};
use crate::event_bus::Event;
use crate::graphs::Route;
use crate::node::NodePartial;
use crate::schedulers::{BranchFailure, BranchId, Invocation, Scheduler, SchedulerError};
use crate::state::{RunState, StateError, StateSnapshot};
use crate::types::NodeKind;
use crate::utils::id_generator::IdGenerator;

use super::runtime_config::FailurePolicy;

/// Terminal status of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The frontier reached `End` (or emptied) before any bound was hit.
    Completed,
    /// The step bound was reached with work still pending.
    MaxStepsExceeded,
    /// Cancellation was requested; state reflects the last completed step.
    Cancelled,
    /// A branch failed under the fail-fast policy.
    Failed { reason: String },
}

impl RunStatus {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Final product of a run: terminal status plus the state merged through the
/// last fully completed superstep.
#[derive(Debug)]
pub struct RunResult {
    final_state: FxHashMap<String, Value>,
    steps_taken: u64,
    status: RunStatus,
    failures: Vec<BranchFailure>,
}

impl RunResult {
    #[must_use]
    pub fn final_state(&self) -> &FxHashMap<String, Value> {
        &self.final_state
    }

    /// Final value of one schema field.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.final_state.get(field)
    }

    /// Number of fully completed (merged) supersteps.
    #[must_use]
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    #[must_use]
    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Branch failures observed during the run (fail-soft runs may complete
    /// with failures recorded here).
    #[must_use]
    pub fn failures(&self) -> &[BranchFailure] {
        &self.failures
    }
}

/// Run-terminating errors. Branch failures are not errors at this level;
/// they surface through [`RunStatus::Failed`] / [`RunResult::failures`].
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    /// A router named a target missing from the node registry.
    #[error("router for {from} returned unknown target {target} at step {step}")]
    #[diagnostic(
        code(stategraph::runtimes::unknown_route_target),
        help("Register the node with add_node, or fix the router's Route.")
    )]
    UnknownRouteTarget {
        from: NodeKind,
        target: NodeKind,
        step: u64,
    },

    /// Initial state named an undeclared field.
    #[error(transparent)]
    #[diagnostic(transparent)]
    State(#[from] StateError),

    /// A barrier merge failed (undeclared field or reducer mismatch).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Merge(#[from] MergeError),

    /// A superstep aborted (unregistered frontier node or task panic).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The background run task could not be joined.
    #[error("run task join failed: {message}")]
    #[diagnostic(code(stategraph::runtimes::join))]
    Join { message: String },
}

/// Handle to a run started with
/// [`invoke_streaming`](crate::app::App::invoke_streaming).
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancelToken,
    join: JoinHandle<Result<RunResult, RunError>>,
}

impl RunHandle {
    pub(crate) fn new(cancel: CancelToken, join: JoinHandle<Result<RunResult, RunError>>) -> Self {
        Self { cancel, join }
    }

    /// Request cooperative cancellation. The current superstep completes and
    /// merges; no further step is dispatched.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to finish and return its result.
    pub async fn join(self) -> Result<RunResult, RunError> {
        self.join.await.map_err(|join_error| RunError::Join {
            message: join_error.to_string(),
        })?
    }
}

/// Drives one run of a compiled app to a terminal status.
pub struct Runner<'app> {
    app: &'app App,
    scheduler: Scheduler,
    event_sender: flume::Sender<Event>,
    cancellation: CancelSignal,
    run_id: String,
}

impl<'app> Runner<'app> {
    pub fn new(
        app: &'app App,
        event_sender: flume::Sender<Event>,
        cancellation: CancelSignal,
    ) -> Self {
        let config = app.runtime_config();
        let concurrency = config.concurrency_limit.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(4)
        });
        let run_id = config
            .run_id
            .clone()
            .unwrap_or_else(|| IdGenerator::new().generate_run_id());
        Self {
            app,
            scheduler: Scheduler::new(concurrency),
            event_sender,
            cancellation,
            run_id,
        }
    }

    /// Execute the run loop to a terminal status.
    pub async fn run(&mut self, initial: NodePartial) -> Result<RunResult, RunError> {
        let config = self.app.runtime_config();
        let mut state = RunState::new(self.app.schema(), initial.updates())?;
        let mut failures: Vec<BranchFailure> = Vec::new();
        let mut steps_taken: u64 = 0;

        tracing::info!(target: "stategraph::runtimes", run_id = %self.run_id, "run started");

        let frontier_span = tracing::info_span!("frontier", run_id = %self.run_id, step = 0);
        let mut frontier = frontier_span.in_scope(|| {
            self.next_frontier(&[NodeKind::Start], &state.snapshot(), 0)
        })?;

        loop {
            if self.cancellation.is_cancelled() {
                return Ok(self.finish(state, steps_taken, RunStatus::Cancelled, failures));
            }
            if Self::is_terminal(&frontier) {
                return Ok(self.finish(state, steps_taken, RunStatus::Completed, failures));
            }
            if let Some(max) = config.max_steps
                && steps_taken >= max
            {
                return Ok(self.finish(state, steps_taken, RunStatus::MaxStepsExceeded, failures));
            }

            let step = steps_taken + 1;
            let snapshot = state.snapshot();

            let schedule_span =
                tracing::info_span!("schedule", run_id = %self.run_id, step);
            let step_result = self
                .scheduler
                .superstep(
                    self.app.nodes(),
                    &frontier,
                    snapshot,
                    step,
                    config.node_timeout,
                    self.event_sender.clone(),
                    self.cancellation.clone(),
                )
                .instrument(schedule_span)
                .await?;

            if !step_result.failures.is_empty() {
                match config.failure_policy {
                    FailurePolicy::FailFast => {
                        let reason = step_result.failures[0].error.to_string();
                        failures.extend(step_result.failures);
                        return Ok(self.finish(
                            state,
                            steps_taken,
                            RunStatus::Failed { reason },
                            failures,
                        ));
                    }
                    FailurePolicy::FailSoft => {
                        failures.extend(step_result.failures);
                    }
                }
            }

            let partials: Vec<NodePartial> = step_result
                .outputs
                .iter()
                .map(|(_, partial)| partial.clone())
                .collect();
            let barrier_span = tracing::info_span!("barrier", run_id = %self.run_id, step);
            let outcome = barrier_span.in_scope(|| self.app.apply_barrier(&mut state, &partials))?;
            steps_taken = step;

            tracing::info!(
                target: "stategraph::runtimes",
                run_id = %self.run_id,
                step,
                ran = step_result.ran_nodes.len(),
                updated = ?outcome.updated_fields,
                "superstep merged"
            );

            let mut origins: Vec<NodeKind> = Vec::new();
            for node in &step_result.ran_nodes {
                if !origins.contains(node) {
                    origins.push(node.clone());
                }
            }

            let frontier_span =
                tracing::info_span!("frontier", run_id = %self.run_id, step);
            frontier = frontier_span
                .in_scope(|| self.next_frontier(&origins, &state.snapshot(), step))?;
        }
    }

    /// A frontier with no executable work left.
    fn is_terminal(frontier: &[Invocation]) -> bool {
        frontier.is_empty() || frontier.iter().all(|invocation| invocation.node.is_end())
    }

    /// Compute the frontier that follows `origins` over `snapshot`.
    ///
    /// Static edge targets join first (deduplicated across the whole
    /// frontier, which is what makes a shared successor a join node), then
    /// each origin's conditional edges are routed. Fan-out dispatches are
    /// never deduplicated: each dispatch is its own branch. Branch ids are
    /// assigned by final position.
    fn next_frontier(
        &self,
        origins: &[NodeKind],
        snapshot: &StateSnapshot,
        step: u64,
    ) -> Result<Vec<Invocation>, RunError> {
        let mut invocations: Vec<Invocation> = Vec::new();
        let mut seen: Vec<NodeKind> = Vec::new();

        for origin in origins {
            if let Some(targets) = self.app.edges().get(origin) {
                for target in targets {
                    if !seen.contains(target) {
                        seen.push(target.clone());
                        invocations.push(Invocation::new(target.clone(), BranchId(0), None));
                    }
                }
            }

            for edge in self
                .app
                .conditional_edges()
                .iter()
                .filter(|edge| edge.from() == origin)
            {
                match (edge.router())(snapshot.clone()) {
                    Route::To(target) => {
                        if !target.is_end() && !self.app.nodes().contains_key(&target) {
                            tracing::error!(
                                target: "stategraph::runtimes",
                                run_id = %self.run_id,
                                from = %origin,
                                to = %target,
                                step,
                                "router returned unknown target"
                            );
                            return Err(RunError::UnknownRouteTarget {
                                from: origin.clone(),
                                target,
                                step,
                            });
                        }
                        if !seen.contains(&target) {
                            seen.push(target.clone());
                            invocations.push(Invocation::new(target, BranchId(0), None));
                        }
                    }
                    Route::Fanout(dispatches) => {
                        for dispatch in dispatches {
                            let (node, input) = dispatch.into_parts();
                            if !node.is_custom() || !self.app.nodes().contains_key(&node) {
                                tracing::error!(
                                    target: "stategraph::runtimes",
                                    run_id = %self.run_id,
                                    from = %origin,
                                    to = %node,
                                    step,
                                    "fan-out dispatch targets unknown node"
                                );
                                return Err(RunError::UnknownRouteTarget {
                                    from: origin.clone(),
                                    target: node,
                                    step,
                                });
                            }
                            invocations.push(Invocation::new(node, BranchId(0), Some(input)));
                        }
                    }
                }
            }
        }

        for (position, invocation) in invocations.iter_mut().enumerate() {
            invocation.branch = BranchId(position);
        }
        Ok(invocations)
    }

    fn finish(
        &self,
        state: RunState,
        steps_taken: u64,
        status: RunStatus,
        failures: Vec<BranchFailure>,
    ) -> RunResult {
        tracing::info!(
            target: "stategraph::runtimes",
            run_id = %self.run_id,
            steps_taken,
            status = ?status,
            failures = failures.len(),
            "run finished"
        );
        let _ = self.event_sender.send(Event::diagnostic(
            "runner",
            format!("run {} finished after {steps_taken} steps: {status:?}", self.run_id),
        ));
        RunResult {
            final_state: state.into_values(),
            steps_taken,
            status,
            failures,
        }
    }
}
