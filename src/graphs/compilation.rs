//! Graph compilation: validation and sealing into an executable [`App`].

use miette::Diagnostic;
use thiserror::Error;

use crate::app::App;
use crate::types::NodeKind;

use super::builder::GraphBuilder;

/// Errors detected while compiling a [`GraphBuilder`] into an [`App`].
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    /// The same node id was registered more than once via `add_node`.
    #[error("duplicate node id: {0}")]
    #[diagnostic(
        code(stategraph::graphs::duplicate_node_id),
        help("Each node id must be unique; use replace_node for deliberate overrides.")
    )]
    DuplicateNodeId(NodeKind),

    /// A node declares a write to a field the schema does not declare.
    #[error("node {node} declares a write to undeclared field: {field}")]
    #[diagnostic(
        code(stategraph::graphs::schema_violation),
        help("Declare the field in the StateSchema, or fix the node's writes().")
    )]
    SchemaViolation { node: NodeKind, field: String },

    /// A static or conditional edge leaves a node that is not registered.
    #[error("edge from unregistered node: {0}")]
    #[diagnostic(code(stategraph::graphs::unknown_edge_source))]
    UnknownEdgeSource(NodeKind),

    /// A static edge points at a node that is not registered.
    #[error("edge to unregistered node: {0}")]
    #[diagnostic(
        code(stategraph::graphs::unknown_edge_target),
        help("Register the node with add_node before wiring edges to it.")
    )]
    UnknownEdgeTarget(NodeKind),

    /// No static or conditional edge leaves `Start`.
    #[error("graph has no edges out of Start")]
    #[diagnostic(
        code(stategraph::graphs::no_entry_edges),
        help("Add at least one add_edge or add_conditional_edge from NodeKind::Start.")
    )]
    NoEntryEdges,
}

impl GraphBuilder {
    /// Compiles the graph into an executable application.
    ///
    /// Consuming the builder seals the node registry and edge tables: after
    /// this point the topology cannot change. Validation performed here:
    ///
    /// - every `add_node` id was unique ([`BuildError::DuplicateNodeId`])
    /// - every node's declared `writes()` is a schema field
    ///   ([`BuildError::SchemaViolation`])
    /// - static edges connect registered nodes (or the virtual endpoints)
    /// - conditional edges leave registered nodes (or `Start`)
    /// - at least one edge leaves `Start` ([`BuildError::NoEntryEdges`])
    ///
    /// Router *targets* cannot be validated here; they are checked when a
    /// route is followed at run time.
    pub fn compile(self) -> Result<App, BuildError> {
        if let Some(id) = self.duplicate_nodes.first() {
            return Err(BuildError::DuplicateNodeId(id.clone()));
        }

        for (id, node) in &self.nodes {
            for field in node.writes() {
                if !self.schema.contains(&field) {
                    return Err(BuildError::SchemaViolation {
                        node: id.clone(),
                        field,
                    });
                }
            }
        }

        for (from, targets) in &self.edges {
            match from {
                NodeKind::Start => {}
                NodeKind::End => return Err(BuildError::UnknownEdgeSource(NodeKind::End)),
                custom => {
                    if !self.nodes.contains_key(custom) {
                        return Err(BuildError::UnknownEdgeSource(custom.clone()));
                    }
                }
            }
            for to in targets {
                match to {
                    NodeKind::End => {}
                    NodeKind::Start => return Err(BuildError::UnknownEdgeTarget(NodeKind::Start)),
                    custom => {
                        if !self.nodes.contains_key(custom) {
                            return Err(BuildError::UnknownEdgeTarget(custom.clone()));
                        }
                    }
                }
            }
        }

        for edge in &self.conditional_edges {
            match edge.from() {
                NodeKind::Start => {}
                NodeKind::End => return Err(BuildError::UnknownEdgeSource(NodeKind::End)),
                custom => {
                    if !self.nodes.contains_key(custom) {
                        return Err(BuildError::UnknownEdgeSource(custom.clone()));
                    }
                }
            }
        }

        let has_entry = self.edges.contains_key(&NodeKind::Start)
            || self
                .conditional_edges
                .iter()
                .any(|edge| edge.from().is_start());
        if !has_entry {
            return Err(BuildError::NoEntryEdges);
        }

        Ok(App::from_parts(
            self.nodes,
            self.edges,
            self.conditional_edges,
            self.schema,
            self.runtime_config,
        ))
    }
}
