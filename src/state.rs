//! Versioned run state and immutable snapshots.
//!
//! A [`RunState`] exists for exactly one run: it is materialized from the
//! graph's [`StateSchema`](crate::schema::StateSchema) plus the caller's
//! initial values, mutated only at barriers, and consumed into the final
//! [`RunResult`](crate::runtimes::RunResult). Nothing is persisted.
//!
//! Each field lives in its own [`ValueCell`] with a version counter starting
//! at 1. A version bumps by exactly one per superstep iff the barrier merge
//! changed the field's content, so versions double as a cheap change log.
//!
//! Nodes and routers never see `RunState` directly; they receive a
//! [`StateSnapshot`], an immutable point-in-time copy. Fan-out branches see
//! the step snapshot with their dispatch input overlaid on top
//! ([`StateSnapshot::with_overlay`]).

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::StateSchema;

/// A single field's value together with its barrier version.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValueCell {
    value: Value,
    version: u32,
}

impl ValueCell {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value, version: 1 }
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

/// Errors raised while materializing or updating run state.
#[derive(Debug, Error, Diagnostic)]
pub enum StateError {
    /// A write named a field the schema does not declare.
    #[error("undeclared state field: {field}")]
    #[diagnostic(
        code(stategraph::state::undeclared_field),
        help("Declare the field in the StateSchema, or fix the field name in the write.")
    )]
    UndeclaredField { field: String },
}

/// Mutable, versioned state for a single run.
#[derive(Clone, Debug)]
pub struct RunState {
    cells: FxHashMap<String, ValueCell>,
}

impl RunState {
    /// Materialize run state from a schema and the caller's initial values.
    ///
    /// Every schema field starts at its declared default (version 1); initial
    /// values override the default for their field. An initial value for an
    /// undeclared field is a [`StateError::UndeclaredField`].
    pub fn new(
        schema: &StateSchema,
        initial: &FxHashMap<String, Value>,
    ) -> Result<Self, StateError> {
        let mut cells = FxHashMap::default();
        for (name, spec) in schema.iter() {
            cells.insert(name.clone(), ValueCell::new(spec.default.clone()));
        }
        for (name, value) in initial {
            match cells.get_mut(name) {
                Some(cell) => *cell.value_mut() = value.clone(),
                None => {
                    return Err(StateError::UndeclaredField {
                        field: name.clone(),
                    });
                }
            }
        }
        Ok(Self { cells })
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.cells.get(field).map(ValueCell::value)
    }

    #[must_use]
    pub fn version_of(&self, field: &str) -> Option<u32> {
        self.cells.get(field).map(ValueCell::version)
    }

    pub fn cell_mut(&mut self, field: &str) -> Option<&mut ValueCell> {
        self.cells.get_mut(field)
    }

    /// Immutable copy of all values and versions at this point in the run.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let mut values = FxHashMap::default();
        let mut versions = FxHashMap::default();
        for (name, cell) in &self.cells {
            values.insert(name.clone(), cell.value().clone());
            versions.insert(name.clone(), cell.version());
        }
        StateSnapshot { values, versions }
    }

    /// Consume the state into its final field values.
    #[must_use]
    pub fn into_values(self) -> FxHashMap<String, Value> {
        self.cells
            .into_iter()
            .map(|(name, cell)| (name, cell.value))
            .collect()
    }
}

/// Immutable point-in-time view of run state, handed to nodes and routers.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StateSnapshot {
    values: FxHashMap<String, Value>,
    versions: FxHashMap<String, u32>,
}

impl StateSnapshot {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.values.get(field).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn get_array(&self, field: &str) -> Option<&Vec<Value>> {
        self.values.get(field).and_then(Value::as_array)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    #[must_use]
    pub fn version_of(&self, field: &str) -> Option<u32> {
        self.versions.get(field).copied()
    }

    #[must_use]
    pub fn values(&self) -> &FxHashMap<String, Value> {
        &self.values
    }

    /// Snapshot with a branch input overlaid on top (replace semantics).
    ///
    /// Overlay keys need not be schema fields: a fan-out dispatch may carry
    /// branch-local inputs that exist only in the branch's view. Durable
    /// writes are still schema-checked at the barrier.
    #[must_use]
    pub fn with_overlay(&self, overlay: &FxHashMap<String, Value>) -> StateSnapshot {
        let mut out = self.clone();
        for (name, value) in overlay {
            out.values.insert(name.clone(), value.clone());
            out.versions.entry(name.clone()).or_insert(1);
        }
        out
    }
}
