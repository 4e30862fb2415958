//! State schema declaration: named fields with per-field merge strategies.
//!
//! A [`StateSchema`] is the contract between a graph and its nodes. Every
//! field a node may write must be declared up front, together with the
//! [`ReducerKind`] that merges concurrent updates to it at each barrier.
//! Writes to undeclared fields are rejected — at compile time for a node's
//! declared writes, at run time for dynamic updates.
//!
//! # Examples
//!
//! ```rust
//! use serde_json::json;
//! use stategraph::schema::{ReducerKind, StateSchema};
//!
//! let schema = StateSchema::new()
//!     .field("topic", ReducerKind::Replace)
//!     .field("items", ReducerKind::Append)
//!     .field_with_default("settings", ReducerKind::MergeObject, json!({"retries": 3}));
//!
//! assert!(schema.contains("items"));
//! assert_eq!(schema.field_spec("items").unwrap().default, json!([]));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Merge strategy applied to a field when barrier updates arrive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReducerKind {
    /// Last write wins. Updates within a step apply in dispatch order.
    Replace,
    /// Field holds a JSON array; updates must be arrays and are concatenated
    /// in dispatch order.
    Append,
    /// Field holds a JSON object; updates must be objects and are merged by
    /// shallow key union, update keys winning.
    MergeObject,
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Append => write!(f, "append"),
            Self::MergeObject => write!(f, "merge_object"),
        }
    }
}

impl ReducerKind {
    /// Initial value for a field of this kind when no explicit default is given.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Replace => Value::Null,
            Self::Append => Value::Array(Vec::new()),
            Self::MergeObject => Value::Object(serde_json::Map::new()),
        }
    }
}

/// Declaration of a single schema field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub reducer: ReducerKind,
    pub default: Value,
}

impl FieldSpec {
    #[must_use]
    pub fn new(reducer: ReducerKind) -> Self {
        Self {
            default: reducer.default_value(),
            reducer,
        }
    }

    #[must_use]
    pub fn with_default(reducer: ReducerKind, default: Value) -> Self {
        Self { reducer, default }
    }
}

/// The declared field set shared by all nodes of a graph.
#[derive(Clone, Debug, Default)]
pub struct StateSchema {
    fields: FxHashMap<String, FieldSpec>,
}

impl StateSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with the kind's default initial value.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, reducer: ReducerKind) -> Self {
        self.fields.insert(name.into(), FieldSpec::new(reducer));
        self
    }

    /// Declare a field with an explicit initial value.
    #[must_use]
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        reducer: ReducerKind,
        default: Value,
    ) -> Self {
        self.fields
            .insert(name.into(), FieldSpec::with_default(reducer, default));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn reducer_kind(&self, name: &str) -> Option<ReducerKind> {
        self.fields.get(name).map(|spec| spec.reducer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in sorted order, for deterministic iteration.
    #[must_use]
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
