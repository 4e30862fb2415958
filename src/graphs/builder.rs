//! GraphBuilder implementation for constructing workflow graphs.
//!
//! The builder accumulates the node registry, edge tables, state schema,
//! and runtime configuration; [`compile`](GraphBuilder::compile) (in
//! `compilation.rs`) validates the whole and seals it into an
//! [`App`](crate::app::App). Because `compile` consumes the builder, a
//! compiled graph's registry and topology can never change afterwards.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{ConditionalEdge, RouterFn};
use crate::node::Node;
use crate::runtimes::RuntimeConfig;
use crate::schema::StateSchema;
use crate::types::NodeKind;

/// Builder for constructing workflow graphs with a fluent API.
///
/// Every graph needs:
/// - a [`StateSchema`] declaring the fields nodes may write,
/// - at least one executable node added via [`add_node`](Self::add_node),
/// - an edge (static or conditional) out of `NodeKind::Start`.
///
/// `NodeKind::Start` and `NodeKind::End` are virtual endpoints and are never
/// registered with `add_node`; they exist only for topology.
///
/// # Examples
///
/// ```
/// use stategraph::graphs::GraphBuilder;
/// use stategraph::schema::{ReducerKind, StateSchema};
/// use stategraph::types::NodeKind;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl stategraph::node::Node for MyNode {
/// #     async fn run(&self, _: stategraph::state::StateSnapshot, _: stategraph::node::NodeContext) -> Result<stategraph::node::NodePartial, stategraph::node::NodeError> {
/// #         Ok(stategraph::node::NodePartial::default())
/// #     }
/// # }
/// let app = GraphBuilder::new()
///     .with_schema(StateSchema::new().field("items", ReducerKind::Append))
///     .add_node(NodeKind::Custom("worker".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("worker".into()))
///     .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    pub(super) nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    pub(super) edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    pub(super) conditional_edges: Vec<ConditionalEdge>,
    pub(super) schema: StateSchema,
    pub(super) runtime_config: RuntimeConfig,
    /// Ids passed to `add_node` more than once; reported at compile time.
    pub(super) duplicate_nodes: Vec<NodeKind>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder with an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            schema: StateSchema::default(),
            runtime_config: RuntimeConfig::default(),
            duplicate_nodes: Vec::new(),
        }
    }

    /// Sets the state schema all node writes are validated against.
    #[must_use]
    pub fn with_schema(mut self, schema: StateSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Adds a node to the graph.
    ///
    /// Each node id must be unique; registering an id twice is recorded and
    /// fails compilation with
    /// [`BuildError::DuplicateNodeId`](super::BuildError::DuplicateNodeId).
    /// Use [`replace_node`](Self::replace_node) for deliberate replacement.
    ///
    /// `NodeKind::Start` / `NodeKind::End` registrations are ignored with a
    /// warning; they are virtual and never executed.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(
                    ?id,
                    "Ignoring registration of virtual node kind (Start/End are virtual)"
                );
            }
            _ => {
                if self.nodes.contains_key(&id) {
                    self.duplicate_nodes.push(id);
                } else {
                    self.nodes.insert(id, Arc::new(node));
                }
            }
        }
        self
    }

    /// Replaces an existing node registration (or registers a new one).
    ///
    /// The escape hatch for intentional overrides, e.g. swapping a stub for
    /// a real implementation in tests. Virtual kinds are ignored as in
    /// [`add_node`](Self::add_node).
    #[must_use]
    pub fn replace_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(
                    ?id,
                    "Ignoring registration of virtual node kind (Start/End are virtual)"
                );
            }
            _ => {
                self.nodes.insert(id, Arc::new(node));
            }
        }
        self
    }

    /// Adds an unconditional edge between two nodes.
    ///
    /// When the `from` node completes a superstep, `to` joins the next
    /// frontier. Multiple edges from one node fan out; multiple edges into
    /// one node fan in (the target runs once per step, after all its
    /// predecessors from that step merged).
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.entry(from).or_default().push(to);
        self
    }

    /// Adds a conditional edge to the graph.
    ///
    /// After each superstep in which `from` ran, `router` is evaluated on
    /// the merged snapshot and its [`Route`](super::Route) decides the next
    /// frontier contribution: a single node, the terminal marker, or a
    /// fan-out of branch dispatches. A conditional edge from
    /// `NodeKind::Start` is evaluated on the initial snapshot, enabling
    /// entry fan-out.
    #[must_use]
    pub fn add_conditional_edge(mut self, from: NodeKind, router: RouterFn) -> Self {
        self.conditional_edges
            .push(ConditionalEdge::new(from, router));
        self
    }

    /// Configures runtime settings for the compiled application.
    ///
    /// Controls concurrency limits, step bounds, per-node timeouts, failure
    /// policy, and event bus sinks. Defaults apply when not specified.
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }
}
