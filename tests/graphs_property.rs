mod common;

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{Value, json};

use common::{items_schema, quiet_config};
use stategraph::graphs::{Dispatch, GraphBuilder, Route, RouterFn};
use stategraph::node::{Node, NodeContext, NodeError, NodePartial};
use stategraph::schema::ReducerKind;
use stategraph::state::StateSnapshot;
use stategraph::types::NodeKind;

/// Appends every element of the branch-local `content` array to `items`.
struct EmitContent;

#[async_trait]
impl Node for EmitContent {
    fn reads(&self) -> Vec<String> {
        vec!["content".into()]
    }

    fn writes(&self) -> Vec<String> {
        vec!["items".into()]
    }

    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let content = snapshot
            .get_array("content")
            .cloned()
            .ok_or(NodeError::MissingInput { what: "content" })?;
        Ok(NodePartial::new().with("items", Value::Array(content)))
    }
}

fn branch_contents() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z]{1,6}", 0..4), 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Merged appends across any fan-out equal the concatenation of branch
    /// inputs in dispatch order, regardless of completion timing.
    #[test]
    fn fanout_appends_preserve_dispatch_order(contents in branch_contents()) {
        let expected: Vec<Value> = contents
            .iter()
            .flat_map(|branch| branch.iter().map(|s| json!(s)))
            .collect();

        let router: RouterFn = Arc::new(|snapshot| {
            let sections = snapshot.get_array("sections").cloned().unwrap_or_default();
            Route::Fanout(
                sections
                    .into_iter()
                    .map(|section| Dispatch::to("emit").with("content", section))
                    .collect(),
            )
        });

        let app = GraphBuilder::new()
            .with_schema(items_schema().field("sections", ReducerKind::Replace))
            .add_node(NodeKind::Custom("emit".into()), EmitContent)
            .add_conditional_edge(NodeKind::Start, router)
            .with_runtime_config(quiet_config().with_max_steps(1))
            .compile()
            .unwrap();

        let sections: Vec<Value> = contents
            .iter()
            .map(|branch| json!(branch))
            .collect();
        let initial = NodePartial::new().with("sections", Value::Array(sections));

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(app.invoke(initial)).unwrap();

        prop_assert_eq!(
            result.value("items"),
            Some(&Value::Array(expected))
        );
    }
}
