// src/engine/mod.rs

//! Execution engine.
//!
//! This module ties together:
//! - the per-run state table ([`state`]), a pure synchronous state machine
//!   that owns every status transition,
//! - the async [`Scheduler`] shell that dispatches actions on Tokio and feeds
//!   their completions back into the state table,
//! - the aggregate [`RunResult`] handed back to the caller.

use std::time::Duration;

use crate::exec::ActionOutput;

/// Events flowing from running actions back into the scheduler loop.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// A task's action returned (or panicked).
    TaskCompleted {
        /// Registration index of the task.
        index: usize,
        result: anyhow::Result<ActionOutput>,
        elapsed: Duration,
    },
}

pub mod result;
pub mod scheduler;
pub mod state;
pub mod step;

pub use result::{RunResult, TaskOutcome, TaskReport};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use state::RunState;
pub use step::SchedulerStep;
