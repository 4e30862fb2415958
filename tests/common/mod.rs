#![allow(dead_code)]

//! Shared fixtures for integration tests.

pub mod nodes;

use stategraph::runtimes::RuntimeConfig;
use stategraph::schema::{ReducerKind, StateSchema};

/// Schema most scenarios share: an append log plus a couple of scalar slots.
pub fn items_schema() -> StateSchema {
    StateSchema::new()
        .field("items", ReducerKind::Append)
        .field("summary", ReducerKind::Replace)
        .field("meta", ReducerKind::MergeObject)
}

/// Config that keeps test output off stdout.
pub fn quiet_config() -> RuntimeConfig {
    RuntimeConfig::default().with_quiet_event_bus()
}
