//! End-to-end draft/critique loop exercising routing on state, cycles,
//! reducers, and run bounds together.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use common::quiet_config;
use stategraph::graphs::{GraphBuilder, Route, RouterFn};
use stategraph::node::{Node, NodeContext, NodeError, NodePartial};
use stategraph::runtimes::RunStatus;
use stategraph::schema::{ReducerKind, StateSchema};
use stategraph::state::StateSnapshot;
use stategraph::types::NodeKind;

/// Rewrites the draft, one revision marker longer each pass.
struct Revise;

#[async_trait]
impl Node for Revise {
    fn reads(&self) -> Vec<String> {
        vec!["draft".into()]
    }

    fn writes(&self) -> Vec<String> {
        vec!["draft".into()]
    }

    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let draft = snapshot.get_str("draft").unwrap_or("v");
        Ok(NodePartial::new().with("draft", json!(format!("{draft}+"))))
    }
}

/// Scores the current draft and records the critique.
struct Critique;

#[async_trait]
impl Node for Critique {
    fn reads(&self) -> Vec<String> {
        vec!["draft".into()]
    }

    fn writes(&self) -> Vec<String> {
        vec!["critiques".into(), "meta".into()]
    }

    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let draft = snapshot.get_str("draft").unwrap_or_default();
        let score = draft.len() as u64;
        ctx.emit("critique", format!("scored draft at {score}"))?;
        Ok(NodePartial::new()
            .with("critiques", json!([format!("score={score}")]))
            .with("meta", json!({ "last_score": score })))
    }
}

#[tokio::test]
async fn draft_critique_loop_converges_before_the_step_bound() {
    let schema = StateSchema::new()
        .field("draft", ReducerKind::Replace)
        .field("critiques", ReducerKind::Append)
        .field("meta", ReducerKind::MergeObject);

    // Keep revising until the critique says the draft is long enough.
    let router: RouterFn = Arc::new(|snapshot| {
        let score = snapshot
            .get("meta")
            .and_then(|m| m.get("last_score"))
            .and_then(|s| s.as_u64())
            .unwrap_or(0);
        if score >= 4 {
            Route::end()
        } else {
            Route::to("revise")
        }
    });

    let app = GraphBuilder::new()
        .with_schema(schema)
        .add_node(NodeKind::Custom("revise".into()), Revise)
        .add_node(NodeKind::Custom("critique".into()), Critique)
        .add_edge(NodeKind::Start, NodeKind::Custom("revise".into()))
        .add_edge(
            NodeKind::Custom("revise".into()),
            NodeKind::Custom("critique".into()),
        )
        .add_conditional_edge(NodeKind::Custom("critique".into()), router)
        .with_runtime_config(quiet_config().with_max_steps(20))
        .compile()
        .unwrap();

    let initial = NodePartial::new().with("draft", json!("v"));
    let result = app.invoke(initial).await.unwrap();

    assert_eq!(result.status(), &RunStatus::Completed);
    // "v" grows by one per revise pass; score 4 needs three passes, each
    // pass is a revise step plus a critique step.
    assert_eq!(result.value("draft"), Some(&json!("v+++")));
    assert_eq!(result.steps_taken(), 6);
    let critiques = result
        .value("critiques")
        .and_then(|v| v.as_array())
        .unwrap();
    assert_eq!(critiques.len(), 3);
    assert_eq!(critiques.last(), Some(&json!("score=4")));
    assert_eq!(
        result.value("meta").and_then(|m| m.get("last_score")),
        Some(&json!(4))
    );
}
