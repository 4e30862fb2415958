mod common;

use serde_json::json;

use common::nodes::Chatty;
use common::{items_schema, quiet_config};
use stategraph::event_bus::{Event, EventBus, MemorySink};
use stategraph::graphs::GraphBuilder;
use stategraph::node::NodePartial;
use stategraph::types::NodeKind;

fn custom(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

#[tokio::test]
async fn memory_sink_captures_everything_sent_through_the_bus() {
    let sink = MemorySink::new();
    let bus = EventBus::with_sink(sink.clone());
    bus.listen_for_events();

    let sender = bus.get_sender();
    sender
        .send(Event::node_message("scope_a", "first"))
        .unwrap();
    sender
        .send(Event::diagnostic("scope_b", "second"))
        .unwrap();
    bus.stop_listener().await;

    let captured = sink.snapshot();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].message(), "first");
    assert_eq!(captured[1].scope_label(), Some("scope_b"));

    sink.clear();
    assert!(sink.snapshot().is_empty());
}

#[tokio::test]
async fn streaming_run_delivers_node_events_with_metadata() {
    let app = GraphBuilder::new()
        .with_schema(items_schema())
        .add_node(custom("talker"), Chatty { scope: "progress" })
        .add_edge(NodeKind::Start, custom("talker"))
        .add_edge(custom("talker"), NodeKind::End)
        .with_runtime_config(quiet_config())
        .compile()
        .unwrap();

    let (handle, events) = app.invoke_streaming(NodePartial::new());
    let result = handle.join().await.unwrap();
    assert!(result.status().is_completed());

    let received: Vec<Event> = events.try_iter().collect();
    let node_event = received
        .iter()
        .find_map(|event| match event {
            Event::Node(node) => Some(node),
            _ => None,
        })
        .expect("node event was emitted");
    assert_eq!(node_event.scope(), "progress");
    assert_eq!(node_event.message(), "working");
    assert_eq!(node_event.node_id(), Some("talker"));
    assert_eq!(node_event.step(), Some(1));

    // The run itself reports completion through a diagnostic.
    assert!(
        received
            .iter()
            .any(|event| matches!(event, Event::Diagnostic(d) if d.scope() == "runner"))
    );
}

#[test]
fn event_json_shape_is_stable() {
    let event = Event::node_message_with_meta("worker", 3, "progress", "halfway");
    let value = event.to_json_value();
    assert_eq!(value["type"], json!("node"));
    assert_eq!(value["scope"], json!("progress"));
    assert_eq!(value["message"], json!("halfway"));
    assert_eq!(value["metadata"]["node_id"], json!("worker"));
    assert_eq!(value["metadata"]["step"], json!(3));

    let diag = Event::diagnostic("runner", "run complete");
    assert_eq!(diag.to_json_value()["type"], json!("diagnostic"));
    assert_eq!(format!("{event}"), "[worker@3] halfway");
}
