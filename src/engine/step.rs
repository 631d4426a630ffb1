// src/engine/step.rs

//! Step-by-step transition result for [`RunState`](super::RunState).

use crate::types::TaskName;

/// Structured result of a single state-machine step.
///
/// Useful for tests that drive the run state manually and want to assert
/// on exactly what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks that became Ready as a result of this step.
    pub newly_ready: Vec<TaskName>,
    /// Tasks newly marked Skipped because of a failure in this step, in
    /// registration order.
    pub newly_skipped: Vec<TaskName>,
    /// Whether this step left every task in a terminal state.
    pub run_just_finished: bool,
}
