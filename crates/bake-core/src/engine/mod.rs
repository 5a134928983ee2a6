//! Engine module for the step Runner
//!
//! Provides the sequential runner, its builder and the run outcome types.

pub mod core;
pub mod builder;

pub use core::{RunOutcome, RunState, Runner};
pub use builder::RunnerBuilder;
