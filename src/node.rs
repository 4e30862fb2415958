//! Node execution contract: the [`Node`] trait, execution context, partial
//! state updates, and node-level errors.
//!
//! A node is a single unit of computation. It receives an immutable
//! [`StateSnapshot`] and a [`NodeContext`], does its work, and returns a
//! [`NodePartial`] naming the schema fields it wants to update. Nodes never
//! mutate shared state directly; all writes flow through the barrier merge.
//!
//! # Design principles
//!
//! - **Stateless**: nodes should be stateless and deterministic
//! - **Focused**: one well-defined responsibility per node
//! - **Observable**: use the context to emit events for monitoring
//! - **Cooperative**: long-running nodes poll [`NodeContext::is_cancelled`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use serde_json::json;
//! use stategraph::node::{Node, NodeContext, NodeError, NodePartial};
//! use stategraph::state::StateSnapshot;
//!
//! struct Summarize;
//!
//! #[async_trait]
//! impl Node for Summarize {
//!     fn writes(&self) -> Vec<String> {
//!         vec!["summaries".into()]
//!     }
//!
//!     async fn run(
//!         &self,
//!         snapshot: StateSnapshot,
//!         ctx: NodeContext,
//!     ) -> Result<NodePartial, NodeError> {
//!         let content = snapshot
//!             .get_str("content")
//!             .ok_or(NodeError::MissingInput { what: "content" })?;
//!         ctx.emit("summarize", format!("summarizing {} bytes", content.len()))?;
//!         Ok(NodePartial::new().with("summaries", json!([content.to_uppercase()])))
//!     }
//! }
//! ```

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::cancellation::CancelSignal;
use crate::event_bus::Event;
use crate::state::StateSnapshot;

/// Core trait defining executable workflow nodes.
///
/// Returning `Err(NodeError)` marks the branch as failed; the failure policy
/// in [`RuntimeConfig`](crate::runtimes::RuntimeConfig) decides whether that
/// stops the run or only records the failure.
#[async_trait]
pub trait Node: Send + Sync {
    /// Schema fields this node reads. Documentary; not enforced.
    fn reads(&self) -> Vec<String> {
        Vec::new()
    }

    /// Schema fields this node may write. Checked against the schema when
    /// the graph compiles.
    fn writes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Execute this node against a state snapshot.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError>;
}

/// Execution context passed to a node for one invocation.
///
/// `node_label` is the node name, suffixed with `#<branch>` for fan-out
/// branches, so events from parallel branches of the same node stay
/// distinguishable.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Label for this invocation (node name plus branch suffix).
    pub node_label: String,
    /// Current superstep number (1-based).
    pub step: u64,
    /// Channel for emitting events to the run's event bus.
    pub event_bus_sender: flume::Sender<Event>,
    /// Cooperative cancellation flag for this run.
    pub cancellation: CancelSignal,
}

impl NodeContext {
    /// Emit a node-scoped event enriched with this invocation's metadata.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), NodeContextError> {
        self.event_bus_sender
            .send(Event::node_message_with_meta(
                self.node_label.clone(),
                self.step,
                scope,
                message,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }

    /// True once cancellation of the run has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Partial state update returned by a node invocation.
///
/// Maps schema field names to their update values. The reducer declared for
/// each field decides how the update merges at the barrier. Also used as the
/// per-branch input overlay of a fan-out [`Dispatch`](crate::graphs::Dispatch)
/// and as the initial values of a run.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use stategraph::node::NodePartial;
///
/// let partial = NodePartial::new()
///     .with("items", json!(["first"]))
///     .with("status", json!("running"));
/// assert_eq!(partial.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePartial {
    updates: FxHashMap<String, Value>,
}

impl NodePartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.updates.insert(field.into(), value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.updates.insert(field.into(), value);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.updates.get(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    #[must_use]
    pub fn updates(&self) -> &FxHashMap<String, Value> {
        &self.updates
    }

    /// Updated field names in sorted order, for deterministic application.
    #[must_use]
    pub fn sorted_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.updates.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for NodePartial {
    fn from_iter<T: IntoIterator<Item = (S, Value)>>(iter: T) -> Self {
        Self {
            updates: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value))
                .collect(),
        }
    }
}

/// Errors that can occur when using `NodeContext` methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    /// Event could not be sent because the event bus is disconnected.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(stategraph::node::event_bus_unavailable),
        help("The event bus may be disconnected. Check that the run is still active.")
    )]
    EventBusUnavailable,
}

/// Errors that can occur during node execution.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(stategraph::node::missing_input),
        help("Check that an earlier node produced the required field.")
    )]
    MissingInput { what: &'static str },

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(
        code(stategraph::node::validation),
        help("Check input data format and required fields.")
    )]
    ValidationFailed(String),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(stategraph::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(stategraph::node::event_bus))]
    EventBus(#[from] NodeContextError),

    /// The node observed cancellation and stopped early.
    #[error("node cancelled before completion")]
    #[diagnostic(code(stategraph::node::cancelled))]
    Cancelled,
}
