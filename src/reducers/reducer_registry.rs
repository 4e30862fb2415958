use rustc_hash::FxHashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use super::{Append, MapMerge, Reducer, ReducerError, Replace};
use crate::schema::ReducerKind;

/// Resolves a schema field's [`ReducerKind`] to a [`Reducer`] implementation.
///
/// The default registry covers all three built-in kinds. Registering a
/// reducer for a kind that already has one replaces it, which is how custom
/// merge behavior is plugged in.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ReducerKind, Arc<dyn Reducer>>,
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(ReducerKind::Replace, Arc::new(Replace))
            .register(ReducerKind::Append, Arc::new(Append))
            .register(ReducerKind::MergeObject, Arc::new(MapMerge));
        registry
    }
}

impl ReducerRegistry {
    /// Creates a new empty reducer registry.
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Registers a reducer for a kind, replacing any existing registration.
    ///
    /// Returns a mutable reference to self for method chaining.
    pub fn register(&mut self, kind: ReducerKind, reducer: Arc<dyn Reducer>) -> &mut Self {
        self.reducer_map.insert(kind, reducer);
        self
    }

    /// Builder-style method for registering a reducer.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use stategraph::reducers::{Append, ReducerRegistry};
    /// use stategraph::schema::ReducerKind;
    ///
    /// let registry = ReducerRegistry::default()
    ///     .with_reducer(ReducerKind::Append, Arc::new(Append));
    /// ```
    #[must_use]
    pub fn with_reducer(mut self, kind: ReducerKind, reducer: Arc<dyn Reducer>) -> Self {
        self.register(kind, reducer);
        self
    }

    /// Fold one update into a field's current value using the reducer
    /// registered for `kind`.
    #[instrument(skip(self, current, update), err)]
    pub fn try_update(
        &self,
        kind: ReducerKind,
        current: &mut Value,
        update: &Value,
    ) -> Result<(), ReducerError> {
        match self.reducer_map.get(&kind) {
            Some(reducer) => reducer.apply(current, update),
            None => Err(ReducerError::UnknownKind(kind)),
        }
    }
}
