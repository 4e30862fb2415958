//! Run-time execution layer: configuration, the run loop, and run handles.
//!
//! - [`RuntimeConfig`] — step bounds, timeouts, failure policy, concurrency,
//!   and event sink wiring, set on the builder before compilation.
//! - [`Runner`] — drives one run of a compiled app to a terminal
//!   [`RunStatus`]; normally reached through
//!   [`App::invoke`](crate::app::App::invoke) or
//!   [`App::invoke_streaming`](crate::app::App::invoke_streaming).
//! - [`RunHandle`] — cooperative cancellation and joining for streaming runs.

pub mod runner;
pub mod runtime_config;

pub use runner::{RunError, RunHandle, RunResult, RunStatus, Runner};
pub use runtime_config::{EventBusConfig, FailurePolicy, RuntimeConfig, SinkConfig};

pub use crate::cancellation::{CancelSignal, CancelToken};
