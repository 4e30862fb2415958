//! Superstep scheduling: concurrent dispatch of a frontier against one
//! state snapshot.
//!
//! The runner hands the [`Scheduler`] an ordered frontier of
//! [`Invocation`]s. Every invocation runs concurrently (bounded by the
//! scheduler's concurrency limit) against the same snapshot, fan-out
//! branches seeing their dispatch input overlaid on top. Outputs are
//! reported back in dispatch order regardless of completion order, which is
//! what makes the barrier merge deterministic.
//!
//! Branch failures (node errors, timeouts) are collected per invocation
//! rather than short-circuiting the step; the runner's failure policy
//! decides what happens next.

pub mod scheduler;

pub use scheduler::{
    BranchError, BranchFailure, BranchId, Invocation, Scheduler, SchedulerError, StepRunResult,
};
