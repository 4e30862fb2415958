use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::instrument;

use crate::cancellation::CancelSignal;
use crate::event_bus::Event;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Position of an invocation within its superstep's frontier.
///
/// Branch identity is per-dispatch, not per-node: two fan-out branches of
/// the same node get distinct ids within the step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BranchId(pub usize);

impl std::fmt::Display for BranchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a superstep frontier: a node plus its branch identity and
/// optional input overlay.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub node: NodeKind,
    pub branch: BranchId,
    /// Branch-local input from a fan-out dispatch, overlaid on the step
    /// snapshot for this invocation only.
    pub overlay: Option<NodePartial>,
}

impl Invocation {
    #[must_use]
    pub fn new(node: NodeKind, branch: BranchId, overlay: Option<NodePartial>) -> Self {
        Self {
            node,
            branch,
            overlay,
        }
    }

    /// Label for events and logs. Fan-out branches carry a `#<branch>`
    /// suffix so parallel branches of one node stay distinguishable.
    #[must_use]
    pub fn label(&self) -> String {
        match self.overlay {
            Some(_) => format!("{}#{}", self.node, self.branch),
            None => self.node.to_string(),
        }
    }
}

/// Why a single branch of a superstep failed.
#[derive(Debug, Error, Diagnostic)]
pub enum BranchError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Node(#[from] NodeError),

    /// The invocation exceeded the configured per-node timeout.
    #[error("node timed out after {limit:?}")]
    #[diagnostic(
        code(stategraph::schedulers::timeout),
        help("Raise RuntimeConfig::node_timeout or split the node's work.")
    )]
    Timeout { limit: Duration },
}

/// A failed branch, with enough context to report or act on it.
#[derive(Debug)]
pub struct BranchFailure {
    pub node: NodeKind,
    pub branch: BranchId,
    pub step: u64,
    pub when: DateTime<Utc>,
    pub error: BranchError,
}

/// Errors that abort a superstep outright (as opposed to per-branch
/// failures, which are collected in [`StepRunResult::failures`]).
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    /// The frontier named a node missing from the registry. Frontier
    /// validation should make this unreachable; kept as a hard error.
    #[error("frontier references unregistered node {kind} at step {step}")]
    #[diagnostic(code(stategraph::schedulers::unknown_node))]
    UnknownNode { kind: NodeKind, step: u64 },

    /// A spawned invocation panicked or was aborted.
    #[error("node task join failed at step {step}: {message}")]
    #[diagnostic(code(stategraph::schedulers::join))]
    Join { step: u64, message: String },
}

/// Outcome of one superstep.
#[derive(Debug, Default)]
pub struct StepRunResult {
    /// Nodes whose invocations completed successfully, in dispatch order.
    pub ran_nodes: Vec<NodeKind>,
    /// Virtual nodes present in the frontier that were not executed.
    pub skipped_nodes: Vec<NodeKind>,
    /// Successful outputs in dispatch order, for the barrier merge.
    pub outputs: Vec<(Invocation, NodePartial)>,
    /// Failed branches in dispatch order.
    pub failures: Vec<BranchFailure>,
}

/// Dispatches frontiers with bounded concurrency.
#[derive(Clone, Debug)]
pub struct Scheduler {
    pub concurrency_limit: usize,
}

impl Scheduler {
    #[must_use]
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Run every frontier invocation against `snapshot` and collect the
    /// results in dispatch order.
    ///
    /// Virtual `Start`/`End` entries are skipped. Each invocation acquires a
    /// semaphore permit (bounded concurrency), sees the step snapshot plus
    /// its own overlay, and may be wrapped in `node_timeout`. Branch
    /// failures do not abort the step; task panics do.
    #[instrument(skip_all, fields(step = step, frontier = frontier.len()))]
    #[allow(clippy::too_many_arguments)]
    pub async fn superstep(
        &self,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: &[Invocation],
        snapshot: StateSnapshot,
        step: u64,
        node_timeout: Option<Duration>,
        event_sender: flume::Sender<Event>,
        cancellation: CancelSignal,
    ) -> Result<StepRunResult, SchedulerError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut join_set: JoinSet<(usize, Result<NodePartial, BranchError>)> = JoinSet::new();
        let mut executed: Vec<Invocation> = Vec::new();
        let mut skipped_nodes: Vec<NodeKind> = Vec::new();

        for invocation in frontier {
            if invocation.node.is_end() || invocation.node.is_start() {
                skipped_nodes.push(invocation.node.clone());
                continue;
            }
            let node = nodes
                .get(&invocation.node)
                .cloned()
                .ok_or_else(|| SchedulerError::UnknownNode {
                    kind: invocation.node.clone(),
                    step,
                })?;

            let idx = executed.len();
            executed.push(invocation.clone());

            let branch_snapshot = match &invocation.overlay {
                Some(partial) => snapshot.with_overlay(partial.updates()),
                None => snapshot.clone(),
            };
            let ctx = NodeContext {
                node_label: invocation.label(),
                step,
                event_bus_sender: event_sender.clone(),
                cancellation: cancellation.clone(),
            };
            let semaphore = semaphore.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = match node_timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, node.run(branch_snapshot, ctx)).await {
                            Ok(result) => result.map_err(BranchError::Node),
                            Err(_) => Err(BranchError::Timeout { limit }),
                        }
                    }
                    None => node.run(branch_snapshot, ctx).await.map_err(BranchError::Node),
                };
                (idx, outcome)
            });
        }

        let mut results: Vec<Option<Result<NodePartial, BranchError>>> =
            (0..executed.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => results[idx] = Some(outcome),
                Err(join_error) => {
                    return Err(SchedulerError::Join {
                        step,
                        message: join_error.to_string(),
                    });
                }
            }
        }

        let mut result = StepRunResult {
            skipped_nodes,
            ..StepRunResult::default()
        };
        for (invocation, outcome) in executed.into_iter().zip(results.iter_mut()) {
            match outcome.take() {
                Some(Ok(partial)) => {
                    result.ran_nodes.push(invocation.node.clone());
                    result.outputs.push((invocation, partial));
                }
                Some(Err(error)) => {
                    tracing::warn!(
                        target: "stategraph::schedulers",
                        node = %invocation.node,
                        branch = %invocation.branch,
                        step,
                        %error,
                        "branch failed"
                    );
                    let _ = event_sender.send(Event::diagnostic(
                        "scheduler",
                        format!(
                            "branch {} failed at step {step}: {error}",
                            invocation.label()
                        ),
                    ));
                    result.failures.push(BranchFailure {
                        node: invocation.node,
                        branch: invocation.branch,
                        step,
                        when: Utc::now(),
                        error,
                    });
                }
                None => {}
            }
        }

        Ok(result)
    }
}
