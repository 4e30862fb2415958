use serde_json::Value;

use super::{Reducer, ReducerError, json_type_name};

/// Concatenates array updates onto an array field in dispatch order.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct Append;

impl Reducer for Append {
    fn apply(&self, current: &mut Value, update: &Value) -> Result<(), ReducerError> {
        let items = update.as_array().ok_or(ReducerError::TypeMismatch {
            expected: "array",
            found: json_type_name(update),
        })?;
        let found = json_type_name(current);
        let target = current.as_array_mut().ok_or(ReducerError::TypeMismatch {
            expected: "array",
            found,
        })?;
        target.extend(items.iter().cloned());
        Ok(())
    }
}
