//! Constructors for the hash maps used throughout the crate.
//!
//! `FxHashMap` needs its hasher spelled out at construction sites
//! (`FxHashMap::default()`), which reads poorly in node code building
//! updates. These helpers keep call sites short.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// An empty field→value map, as used for updates and branch overlays.
#[must_use]
pub fn new_update_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

/// A field→value map seeded from an iterator of pairs.
#[must_use]
pub fn update_map<S: Into<String>>(
    pairs: impl IntoIterator<Item = (S, Value)>,
) -> FxHashMap<String, Value> {
    pairs
        .into_iter()
        .map(|(field, value)| (field.into(), value))
        .collect()
}
