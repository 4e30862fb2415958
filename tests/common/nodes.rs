//! Reusable node implementations for integration tests.

use async_trait::async_trait;
use serde_json::{Value, json};

use stategraph::node::{Node, NodeContext, NodeError, NodePartial};
use stategraph::state::StateSnapshot;

/// Appends a fixed value to `items`.
pub struct AppendItem {
    pub value: Value,
}

#[async_trait]
impl Node for AppendItem {
    fn writes(&self) -> Vec<String> {
        vec!["items".into()]
    }

    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with("items", json!([self.value])))
    }
}

/// Appends the invocation's label to `items`, making dispatch identity
/// observable in final state.
pub struct AppendLabel;

#[async_trait]
impl Node for AppendLabel {
    fn writes(&self) -> Vec<String> {
        vec!["items".into()]
    }

    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with("items", json!([ctx.node_label])))
    }
}

/// Appends the value of a (possibly overlay-only) snapshot field to `items`.
pub struct AppendField {
    pub from: &'static str,
}

#[async_trait]
impl Node for AppendField {
    fn reads(&self) -> Vec<String> {
        vec![self.from.into()]
    }

    fn writes(&self) -> Vec<String> {
        vec!["items".into()]
    }

    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let value = snapshot
            .get(self.from)
            .cloned()
            .ok_or(NodeError::MissingInput { what: "field" })?;
        Ok(NodePartial::new().with("items", json!([value])))
    }
}

/// Writes one replace-field.
pub struct SetField {
    pub field: &'static str,
    pub value: Value,
}

#[async_trait]
impl Node for SetField {
    fn writes(&self) -> Vec<String> {
        vec![self.field.into()]
    }

    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with(self.field, self.value.clone()))
    }
}

/// Joins `items` into a comma-separated `summary`.
pub struct SummarizeItems;

#[async_trait]
impl Node for SummarizeItems {
    fn reads(&self) -> Vec<String> {
        vec!["items".into()]
    }

    fn writes(&self) -> Vec<String> {
        vec!["summary".into()]
    }

    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let joined = snapshot
            .get_array("items")
            .map(|items| {
                items
                    .iter()
                    .map(|v| v.as_str().unwrap_or_default().to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        Ok(NodePartial::new().with("summary", json!(joined)))
    }
}

/// Always fails with a validation error.
pub struct Failing {
    pub message: &'static str,
}

#[async_trait]
impl Node for Failing {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Err(NodeError::ValidationFailed(self.message.to_string()))
    }
}

/// Sleeps, then appends a value to `items`.
pub struct Sleepy {
    pub millis: u64,
    pub value: Value,
}

#[async_trait]
impl Node for Sleepy {
    fn writes(&self) -> Vec<String> {
        vec!["items".into()]
    }

    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        tokio::time::sleep(std::time::Duration::from_millis(self.millis)).await;
        Ok(NodePartial::new().with("items", json!([self.value])))
    }
}

/// Emits an event in the given scope, then appends to `items`.
pub struct Chatty {
    pub scope: &'static str,
}

#[async_trait]
impl Node for Chatty {
    fn writes(&self) -> Vec<String> {
        vec!["items".into()]
    }

    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        ctx.emit(self.scope, "working")?;
        Ok(NodePartial::new().with("items", json!(["chatty"])))
    }
}

/// Writes a field it never declared; compiles fine, fails at the barrier.
pub struct RogueWriter;

#[async_trait]
impl Node for RogueWriter {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new().with("undeclared_field", json!(1)))
    }
}
