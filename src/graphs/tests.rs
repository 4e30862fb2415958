use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::schema::{ReducerKind, StateSchema};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

struct WriterNode {
    fields: Vec<&'static str>,
}

#[async_trait]
impl Node for WriterNode {
    fn writes(&self) -> Vec<String> {
        self.fields.iter().map(|f| (*f).to_string()).collect()
    }

    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::default())
    }
}

fn writer(fields: Vec<&'static str>) -> WriterNode {
    WriterNode { fields }
}

fn items_schema() -> StateSchema {
    StateSchema::new().field("items", ReducerKind::Append)
}

#[test]
fn compile_accepts_minimal_graph() {
    let app = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec!["items"]))
        .add_edge(NodeKind::Start, "worker".into())
        .add_edge("worker".into(), NodeKind::End)
        .compile()
        .expect("minimal graph should compile");
    assert_eq!(app.nodes().len(), 1);
    assert!(app.schema().contains("items"));
}

#[test]
fn duplicate_node_id_fails_compile() {
    let err = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec![]))
        .add_node("worker".into(), writer(vec![]))
        .add_edge(NodeKind::Start, "worker".into())
        .compile()
        .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateNodeId(NodeKind::Custom(name)) if name == "worker"));
}

#[test]
fn replace_node_is_the_deliberate_override() {
    let app = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec![]))
        .replace_node("worker".into(), writer(vec!["items"]))
        .add_edge(NodeKind::Start, "worker".into())
        .compile()
        .expect("replace_node should not count as a duplicate");
    let node = app.nodes().get(&NodeKind::Custom("worker".into())).unwrap();
    assert_eq!(node.writes(), vec!["items".to_string()]);
}

#[test]
fn undeclared_write_fails_compile() {
    let err = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec!["missing_field"]))
        .add_edge(NodeKind::Start, "worker".into())
        .compile()
        .unwrap_err();
    match err {
        BuildError::SchemaViolation { node, field } => {
            assert_eq!(node, NodeKind::Custom("worker".into()));
            assert_eq!(field, "missing_field");
        }
        other => panic!("expected SchemaViolation, got {other:?}"),
    }
}

#[test]
fn static_edge_to_unregistered_node_fails_compile() {
    let err = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec![]))
        .add_edge(NodeKind::Start, "worker".into())
        .add_edge("worker".into(), "ghost".into())
        .compile()
        .unwrap_err();
    assert!(matches!(err, BuildError::UnknownEdgeTarget(NodeKind::Custom(name)) if name == "ghost"));
}

#[test]
fn conditional_edge_from_unregistered_node_fails_compile() {
    let router: RouterFn = Arc::new(|_| Route::end());
    let err = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec![]))
        .add_edge(NodeKind::Start, "worker".into())
        .add_conditional_edge("ghost".into(), router)
        .compile()
        .unwrap_err();
    assert!(matches!(err, BuildError::UnknownEdgeSource(NodeKind::Custom(name)) if name == "ghost"));
}

#[test]
fn graph_without_entry_edges_fails_compile() {
    let err = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec![]))
        .add_edge("worker".into(), NodeKind::End)
        .compile()
        .unwrap_err();
    assert!(matches!(err, BuildError::NoEntryEdges));
}

#[test]
fn conditional_edge_from_start_counts_as_entry() {
    let router: RouterFn = Arc::new(|_| Route::to("worker"));
    GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec![]))
        .add_conditional_edge(NodeKind::Start, router)
        .compile()
        .expect("conditional entry edge should satisfy the entry check");
}

#[test]
fn virtual_node_registration_is_ignored() {
    let app = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node(NodeKind::Start, writer(vec![]))
        .add_node(NodeKind::End, writer(vec![]))
        .add_node("worker".into(), writer(vec![]))
        .add_edge(NodeKind::Start, "worker".into())
        .compile()
        .expect("virtual registrations are dropped, not errors");
    assert_eq!(app.nodes().len(), 1);
}

#[test]
fn compiled_app_debug_lists_topology() {
    let app = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node("worker".into(), writer(vec!["items"]))
        .add_edge(NodeKind::Start, "worker".into())
        .compile()
        .unwrap();
    let rendered = format!("{app:?}");
    assert!(rendered.contains("App"));
    assert!(rendered.contains("worker"));
    assert!(rendered.contains("items"));
}

#[test]
fn dispatch_builder_accumulates_input() {
    let dispatch = Dispatch::to("summarize")
        .with("content", json!("section"))
        .with("index", json!(2));
    assert_eq!(dispatch.node(), &NodeKind::Custom("summarize".into()));
    assert_eq!(dispatch.input().get("content"), Some(&json!("section")));
    assert_eq!(dispatch.input().get("index"), Some(&json!(2)));
}

#[test]
fn route_end_is_the_terminal_marker() {
    assert!(matches!(Route::end(), Route::To(NodeKind::End)));
}
