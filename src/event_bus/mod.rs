//! Event bus utilities providing fan-out to sinks.
//!
//! Producers (node contexts, the scheduler, the runner) share a flume
//! sender; a background task broadcasts every [`Event`] to the configured
//! [`EventSink`]s. Streaming consumers attach a [`ChannelSink`] and read
//! from the other end.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, NodeEvent};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
