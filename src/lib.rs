//! # Stategraph: Schema-driven Workflow Graph Executor
//!
//! Stategraph executes stateful workflow graphs: typed shared state with
//! per-field reducers, async nodes wired by static and conditional edges,
//! dynamic fan-out into parallel branches, deterministic barrier merges,
//! bounded cycles, and cooperative cancellation.
//!
//! ## Core Concepts
//!
//! - **Schema**: Declared fields with per-field merge strategies (reducers)
//! - **Nodes**: Async units of work that read snapshots and return partial updates
//! - **Graph**: Declarative topology with conditional routers and fan-out dispatch
//! - **Scheduler**: Concurrent supersteps with dispatch-order determinism
//! - **Runner**: Step bounds, failure policy, cancellation, and run results
//!
//! ## Quick Start
//!
//! ```
//! use async_trait::async_trait;
//! use serde_json::json;
//! use stategraph::{
//!     graphs::GraphBuilder,
//!     node::{Node, NodeContext, NodeError, NodePartial},
//!     schema::{ReducerKind, StateSchema},
//!     state::StateSnapshot,
//!     types::NodeKind,
//! };
//!
//! struct Collect;
//!
//! #[async_trait]
//! impl Node for Collect {
//!     fn writes(&self) -> Vec<String> {
//!         vec!["items".into()]
//!     }
//!
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         ctx: NodeContext,
//!     ) -> Result<NodePartial, NodeError> {
//!         ctx.emit("collect", "collected one item")?;
//!         Ok(NodePartial::new().with("items", json!(["item"])))
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = GraphBuilder::new()
//!     .with_schema(StateSchema::new().field("items", ReducerKind::Append))
//!     .add_node(NodeKind::Custom("collect".into()), Collect)
//!     .add_edge(NodeKind::Start, NodeKind::Custom("collect".into()))
//!     .add_edge(NodeKind::Custom("collect".into()), NodeKind::End)
//!     .compile()?;
//!
//! let result = app.invoke(NodePartial::new()).await?;
//! assert!(result.status().is_completed());
//! assert_eq!(result.value("items"), Some(&json!(["item"])));
//! # Ok(())
//! # }
//! ```
//!
//! ## Dynamic Routing and Fan-out
//!
//! Conditional edges carry a router evaluated on the merged snapshot after
//! each step the source node ran:
//!
//! ```
//! use std::sync::Arc;
//! use stategraph::graphs::{Dispatch, Route, RouterFn};
//!
//! // Loop back until three items accumulated, then finish.
//! let router: RouterFn = Arc::new(|snapshot| {
//!     match snapshot.get_array("items") {
//!         Some(items) if items.len() >= 3 => Route::end(),
//!         _ => Route::to("collect"),
//!     }
//! });
//!
//! // Or dispatch one parallel branch per pending section:
//! let fan_out: RouterFn = Arc::new(|snapshot| {
//!     let sections = snapshot.get_array("sections").cloned().unwrap_or_default();
//!     Route::Fanout(
//!         sections
//!             .into_iter()
//!             .map(|s| Dispatch::to("summarize").with("content", s))
//!             .collect(),
//!     )
//! });
//! ```
//!
//! All branches of a step complete before one barrier merge; appends land in
//! dispatch order, so concurrent runs are reproducible.
//!
//! ## Bounds, Failures, Cancellation
//!
//! [`RuntimeConfig`](runtimes::RuntimeConfig) sets `max_steps` (cycles end
//! with `MaxStepsExceeded` after exactly that many steps), a per-node
//! timeout, and the failure policy (fail-fast discards the failing step;
//! fail-soft merges surviving branches and records failures).
//! [`invoke_streaming`](app::App::invoke_streaming) returns a
//! [`RunHandle`](runtimes::RunHandle) for cooperative cancellation plus a
//! live event receiver.
//!
//! ## Module Guide
//!
//! - [`schema`] - Field declarations and reducer kinds
//! - [`state`] - Versioned run state and snapshots
//! - [`node`] - Node trait and execution primitives
//! - [`graphs`] - Graph definition, routers, and compilation
//! - [`schedulers`] - Concurrent superstep dispatch
//! - [`runtimes`] - Run loop, configuration, results, cancellation
//! - [`reducers`] - State merge strategies
//! - [`event_bus`] / [`telemetry`] - Structured events, sinks, formatting

pub mod app;
pub mod cancellation;
pub mod event_bus;
pub mod graphs;
pub mod node;
pub mod reducers;
pub mod runtimes;
pub mod schedulers;
pub mod schema;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod utils;
