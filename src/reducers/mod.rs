//! Per-field merge strategies applied at each barrier.
//!
//! A [`Reducer`] folds one update value into a field's current value. The
//! three built-in reducers correspond to the three
//! [`ReducerKind`](crate::schema::ReducerKind)s a schema can declare:
//! [`Replace`], [`Append`], and [`MapMerge`]. The
//! [`ReducerRegistry`] resolves a kind to its implementation; custom
//! reducers can be registered for a kind to override the default behavior.

pub mod append;
pub mod map_merge;
pub mod reducer_registry;
pub mod replace;

pub use append::Append;
pub use map_merge::MapMerge;
pub use reducer_registry::ReducerRegistry;
pub use replace::Replace;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::schema::ReducerKind;

/// Folds a single update into a field's current value.
pub trait Reducer: Send + Sync {
    fn apply(&self, current: &mut Value, update: &Value) -> Result<(), ReducerError>;
}

/// Errors surfaced while applying reducers.
#[derive(Debug, Error, Diagnostic)]
pub enum ReducerError {
    /// The update (or current value) has the wrong JSON shape for the
    /// field's reducer, e.g. appending a non-array.
    #[error("reducer type mismatch: expected {expected}, found {found}")]
    #[diagnostic(
        code(stategraph::reducers::type_mismatch),
        help("Check the field's ReducerKind against the value the node produced.")
    )]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// No reducer registered for the requested kind.
    #[error("no reducer registered for kind: {0}")]
    #[diagnostic(code(stategraph::reducers::unknown_kind))]
    UnknownKind(ReducerKind),
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
