mod common;

use serde_json::json;

use common::items_schema;
use stategraph::state::{RunState, StateError};
use stategraph::utils::collections::{new_update_map, update_map};

#[test]
fn fields_start_at_schema_defaults_version_one() {
    let state = RunState::new(&items_schema(), &new_update_map()).unwrap();
    assert_eq!(state.get("items"), Some(&json!([])));
    assert_eq!(state.get("summary"), Some(&json!(null)));
    assert_eq!(state.get("meta"), Some(&json!({})));
    assert_eq!(state.version_of("items"), Some(1));
}

#[test]
fn initial_values_override_defaults() {
    let initial = update_map([("items", json!(["seed"])), ("summary", json!("start"))]);
    let state = RunState::new(&items_schema(), &initial).unwrap();
    assert_eq!(state.get("items"), Some(&json!(["seed"])));
    assert_eq!(state.get("summary"), Some(&json!("start")));
    // Overrides do not count as barrier updates.
    assert_eq!(state.version_of("items"), Some(1));
}

#[test]
fn undeclared_initial_field_is_rejected() {
    let initial = update_map([("bogus", json!(1))]);
    let err = RunState::new(&items_schema(), &initial).unwrap_err();
    assert!(matches!(err, StateError::UndeclaredField { field } if field == "bogus"));
}

#[test]
fn snapshot_reflects_state_and_overlay_shadows_it() {
    let initial = update_map([("summary", json!("base"))]);
    let state = RunState::new(&items_schema(), &initial).unwrap();
    let snapshot = state.snapshot();
    assert_eq!(snapshot.get_str("summary"), Some("base"));
    assert_eq!(snapshot.version_of("summary"), Some(1));

    // Overlay replaces a field and may introduce branch-local keys.
    let overlay = update_map([("summary", json!("branch")), ("content", json!("sec-1"))]);
    let branch_view = snapshot.with_overlay(&overlay);
    assert_eq!(branch_view.get_str("summary"), Some("branch"));
    assert_eq!(branch_view.get_str("content"), Some("sec-1"));

    // The base snapshot is untouched.
    assert_eq!(snapshot.get_str("summary"), Some("base"));
    assert!(!snapshot.contains("content"));
}

#[test]
fn into_values_returns_final_fields() {
    let state = RunState::new(&items_schema(), &update_map([("items", json!([1]))])).unwrap();
    let values = state.into_values();
    assert_eq!(values.get("items"), Some(&json!([1])));
    assert_eq!(values.len(), 3);
}
