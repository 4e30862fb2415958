use serde_json::Value;

use super::{Reducer, ReducerError, json_type_name};

/// Shallow key union of object updates into an object field. Update keys win
/// over existing keys; nested objects are not merged recursively.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn apply(&self, current: &mut Value, update: &Value) -> Result<(), ReducerError> {
        let entries = update.as_object().ok_or(ReducerError::TypeMismatch {
            expected: "object",
            found: json_type_name(update),
        })?;
        let found = json_type_name(current);
        let target = current.as_object_mut().ok_or(ReducerError::TypeMismatch {
            expected: "object",
            found,
        })?;
        for (k, v) in entries {
            target.insert(k.clone(), v.clone());
        }
        Ok(())
    }
}
