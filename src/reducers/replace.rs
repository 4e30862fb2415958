use serde_json::Value;

use super::{Reducer, ReducerError};

/// Last write wins. Within a step, updates apply in dispatch order, so the
/// final branch to update the field supplies its value.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct Replace;

impl Reducer for Replace {
    fn apply(&self, current: &mut Value, update: &Value) -> Result<(), ReducerError> {
        *current = update.clone();
        Ok(())
    }
}
