//! Graph construction: builder, edges, routers, and compilation.
//!
//! Workflow graphs are built with [`GraphBuilder`]'s fluent API and sealed
//! into an executable [`App`](crate::app::App) by
//! [`compile`](GraphBuilder::compile). Static topology lives in the edge
//! table; dynamic routing (single successor, terminal marker, or fan-out)
//! goes through [`ConditionalEdge`] routers returning a [`Route`].

pub mod builder;
pub mod compilation;
pub mod edges;

#[cfg(test)]
mod tests;

pub use builder::GraphBuilder;
pub use compilation::BuildError;
pub use edges::{ConditionalEdge, Dispatch, Route, RouterFn};
