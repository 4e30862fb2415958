//! Edge types and routing for conditional graph flow.
//!
//! Static edges live in the builder's edge table; this module holds the
//! dynamic side: [`Route`], the value a router returns, and
//! [`ConditionalEdge`], a source node paired with a [`RouterFn`]. A router
//! inspects the post-merge [`StateSnapshot`](crate::state::StateSnapshot)
//! and either names a single successor, the terminal marker, or a fan-out of
//! parallel branch dispatches.

use std::sync::Arc;

use serde_json::Value;

use crate::node::NodePartial;
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// A single fan-out branch: the node to run and its branch-local input.
///
/// The input is overlaid (replace semantics) on the step snapshot seen by
/// that branch only; it never touches shared state directly.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stategraph::graphs::Dispatch;
///
/// let branch = Dispatch::to("summarize").with("content", json!("section one"));
/// assert_eq!(branch.node().to_string(), "summarize");
/// ```
#[derive(Clone, Debug)]
pub struct Dispatch {
    node: NodeKind,
    input: NodePartial,
}

impl Dispatch {
    /// Dispatch a branch to `node` with an empty input overlay.
    #[must_use]
    pub fn to(node: impl Into<NodeKind>) -> Self {
        Self {
            node: node.into(),
            input: NodePartial::new(),
        }
    }

    /// Replace the branch input wholesale.
    #[must_use]
    pub fn with_input(mut self, input: NodePartial) -> Self {
        self.input = input;
        self
    }

    /// Add one field to the branch input.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.input.insert(field, value);
        self
    }

    #[must_use]
    pub fn node(&self) -> &NodeKind {
        &self.node
    }

    #[must_use]
    pub fn input(&self) -> &NodePartial {
        &self.input
    }

    #[must_use]
    pub fn into_parts(self) -> (NodeKind, NodePartial) {
        (self.node, self.input)
    }
}

/// Routing decision returned by a conditional edge's router.
#[derive(Clone, Debug)]
pub enum Route {
    /// Route to a single node. `Route::To(NodeKind::End)` (or [`Route::end`])
    /// is the terminal marker.
    To(NodeKind),
    /// Dispatch every listed branch in parallel in the next superstep.
    /// Duplicate nodes are allowed; each entry is its own branch.
    Fanout(Vec<Dispatch>),
}

impl Route {
    /// Route to a single named node.
    #[must_use]
    pub fn to(target: impl Into<NodeKind>) -> Self {
        Route::To(target.into())
    }

    /// The terminal marker: this path of the run is finished.
    #[must_use]
    pub fn end() -> Self {
        Route::To(NodeKind::End)
    }
}

/// Router function for conditional edge routing.
///
/// Evaluated on the merged snapshot after each superstep in which the source
/// node ran (and on the initial snapshot for edges out of `Start`). Targets
/// are validated when the route is followed: an unknown node terminates the
/// run with a routing error.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stategraph::graphs::{Dispatch, Route, RouterFn};
///
/// // Loop until enough items have accumulated, then finish.
/// let until_done: RouterFn = Arc::new(|snapshot| {
///     match snapshot.get_array("items") {
///         Some(items) if items.len() >= 3 => Route::end(),
///         _ => Route::to("collect"),
///     }
/// });
///
/// // Fan out one branch per pending section.
/// let per_section: RouterFn = Arc::new(|snapshot| {
///     let sections = snapshot.get_array("sections").cloned().unwrap_or_default();
///     Route::Fanout(
///         sections
///             .into_iter()
///             .map(|s| Dispatch::to("summarize").with("content", s))
///             .collect(),
///     )
/// });
/// ```
pub type RouterFn = Arc<dyn Fn(StateSnapshot) -> Route + Send + Sync + 'static>;

/// A conditional edge: a source node paired with a router.
///
/// Private fields keep construction behind
/// [`GraphBuilder::add_conditional_edge`](crate::graphs::GraphBuilder::add_conditional_edge)
/// and [`ConditionalEdge::new`].
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    router: RouterFn,
}

impl ConditionalEdge {
    pub fn new(from: impl Into<NodeKind>, router: RouterFn) -> Self {
        Self {
            from: from.into(),
            router,
        }
    }

    /// The source node of this conditional edge.
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The router evaluated when the source node has run.
    pub fn router(&self) -> &RouterFn {
        &self.router
    }
}
