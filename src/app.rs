//! Compiled workflow application: sealed topology, barrier merge, and run
//! entry points.
//!
//! An [`App`] is produced by [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile)
//! and is immutable from then on. It owns the node registry, edge tables,
//! state schema, reducer registry, and runtime configuration, and exposes:
//!
//! - [`App::apply_barrier`]: the deterministic merge of one superstep's
//!   partial updates into run state,
//! - [`App::invoke`]: run to completion with the configured sinks,
//! - [`App::invoke_streaming`]: run in the background, returning a
//!   [`RunHandle`] for cancellation plus a live event receiver.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::cancellation::{CancelSignal, cancel_pair};
use crate::event_bus::{ChannelSink, Event, EventBus, EventSink, MemorySink, StdOutSink};
use crate::graphs::ConditionalEdge;
use crate::node::{Node, NodePartial};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::runtimes::{RunError, RunHandle, RunResult, Runner, RuntimeConfig, SinkConfig};
use crate::schema::StateSchema;
use crate::state::RunState;
use crate::types::NodeKind;

/// Errors surfaced while merging a superstep's updates at the barrier.
///
/// Either variant terminates the run with no partial application of the
/// failing step.
#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    /// A node update named a field the schema does not declare.
    #[error("update to undeclared state field: {field}")]
    #[diagnostic(
        code(stategraph::app::undeclared_field),
        help("Declare the field in the StateSchema, or fix the node's update.")
    )]
    UndeclaredField { field: String },

    /// The field's reducer rejected the update value.
    #[error("reducer failed for field {field}")]
    #[diagnostic(code(stategraph::app::reducer))]
    Reducer {
        field: String,
        #[source]
        source: ReducerError,
    },
}

/// Summary of one barrier application.
#[derive(Debug, Clone, Default)]
pub struct BarrierOutcome {
    /// Fields whose content changed this step (sorted). Each had its version
    /// bumped by exactly one.
    pub updated_fields: Vec<String>,
}

/// Compiled, executable workflow graph.
#[derive(Clone)]
pub struct App {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    conditional_edges: Vec<ConditionalEdge>,
    schema: StateSchema,
    reducer_registry: ReducerRegistry,
    runtime_config: RuntimeConfig,
}

// Node implementations are opaque trait objects, so Debug shows topology
// only.
impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("conditional_edges", &self.conditional_edges.len())
            .field("schema_fields", &self.schema.sorted_names())
            .finish_non_exhaustive()
    }
}

impl App {
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, Vec<NodeKind>>,
        conditional_edges: Vec<ConditionalEdge>,
        schema: StateSchema,
        runtime_config: RuntimeConfig,
    ) -> Self {
        Self {
            nodes,
            edges,
            conditional_edges,
            schema,
            reducer_registry: ReducerRegistry::default(),
            runtime_config,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, Vec<NodeKind>> {
        &self.edges
    }

    #[must_use]
    pub fn conditional_edges(&self) -> &[ConditionalEdge] {
        &self.conditional_edges
    }

    #[must_use]
    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Merge one superstep's partial updates into run state.
    ///
    /// Determinism: partials are folded in dispatch order, and within each
    /// partial fields apply in sorted order, so append order across branches
    /// equals dispatch order and repeated runs produce identical state.
    ///
    /// Atomicity: all updates are folded onto scratch copies first; an
    /// undeclared field or reducer failure returns `Err` with the state
    /// untouched. On success each changed field's version bumps by exactly
    /// one; unchanged fields keep their version.
    pub fn apply_barrier(
        &self,
        state: &mut RunState,
        partials: &[NodePartial],
    ) -> Result<BarrierOutcome, MergeError> {
        let mut scratch: FxHashMap<String, Value> = FxHashMap::default();

        for partial in partials {
            for field in partial.sorted_fields() {
                let Some(update) = partial.get(field) else {
                    continue;
                };
                let kind =
                    self.schema
                        .reducer_kind(field)
                        .ok_or_else(|| MergeError::UndeclaredField {
                            field: field.to_string(),
                        })?;
                if !scratch.contains_key(field) {
                    let current = state.get(field).cloned().ok_or_else(|| {
                        MergeError::UndeclaredField {
                            field: field.to_string(),
                        }
                    })?;
                    scratch.insert(field.to_string(), current);
                }
                if let Some(current) = scratch.get_mut(field) {
                    self.reducer_registry
                        .try_update(kind, current, update)
                        .map_err(|source| MergeError::Reducer {
                            field: field.to_string(),
                            source,
                        })?;
                }
            }
        }

        let mut touched: Vec<String> = scratch.keys().cloned().collect();
        touched.sort_unstable();

        let mut updated_fields = Vec::new();
        for field in touched {
            let Some(new_value) = scratch.remove(&field) else {
                continue;
            };
            if let Some(cell) = state.cell_mut(&field) {
                if *cell.value() != new_value {
                    let before = cell.version();
                    *cell.value_mut() = new_value;
                    cell.set_version(before.saturating_add(1));
                    tracing::info!(
                        target: "stategraph::app",
                        field = %field,
                        version = before.saturating_add(1),
                        "barrier updated field"
                    );
                    updated_fields.push(field);
                }
            }
        }

        Ok(BarrierOutcome { updated_fields })
    }

    /// Execute the graph to completion with the configured event sinks.
    ///
    /// `initial` supplies starting values for schema fields (an undeclared
    /// field here fails the run before the first step). The returned
    /// [`RunResult`] carries the final state, steps taken, and terminal
    /// status; `Err` is reserved for run-terminating infrastructure errors
    /// (routing to unknown nodes, schema violations, task panics).
    pub async fn invoke(&self, initial: NodePartial) -> Result<RunResult, RunError> {
        let bus = self.build_event_bus();
        bus.listen_for_events();
        let mut runner = Runner::new(self, bus.get_sender(), CancelSignal::never());
        let result = runner.run(initial).await;
        bus.stop_listener().await;
        result
    }

    /// Execute the graph in a background task.
    ///
    /// Returns a [`RunHandle`] for cooperative cancellation and joining,
    /// plus a receiver carrying every [`Event`] the run emits (in addition
    /// to the configured sinks). Dropping the receiver does not affect the
    /// run.
    #[must_use]
    pub fn invoke_streaming(
        &self,
        initial: NodePartial,
    ) -> (RunHandle, flume::Receiver<Event>) {
        let (tx, rx) = flume::unbounded();
        let bus = self.build_event_bus();
        bus.add_sink(ChannelSink::new(tx));
        bus.listen_for_events();

        let (token, signal) = cancel_pair();
        let app = self.clone();
        let join = tokio::spawn(async move {
            let mut runner = Runner::new(&app, bus.get_sender(), signal);
            let result = runner.run(initial).await;
            bus.stop_listener().await;
            result
        });

        (RunHandle::new(token, join), rx)
    }

    fn build_event_bus(&self) -> EventBus {
        let sinks: Vec<Box<dyn EventSink>> = self
            .runtime_config
            .event_bus
            .sinks()
            .iter()
            .map(|sink| match sink {
                SinkConfig::StdOut => Box::new(StdOutSink::default()) as Box<dyn EventSink>,
                SinkConfig::Memory => Box::new(MemorySink::new()) as Box<dyn EventSink>,
            })
            .collect();
        EventBus::with_sinks(sinks)
    }
}
