// src/types.rs

//! Small shared types used across the DAG model and the engine.

use std::fmt;

/// Canonical task identifier type.
pub type TaskName = String;

/// Per-run status of a task.
///
/// `Pending → Ready → Running → {Succeeded | Failed}`; tasks that never get
/// to run end as `Skipped` (an upstream task failed) or `Cancelled` (the
/// run was cancelled before they started).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Waiting on at least one dependency.
    Pending,
    /// All dependencies succeeded; waiting for a dispatch slot.
    Ready,
    /// Dispatched; the action is executing.
    Running,
    Succeeded,
    Failed,
    /// Never ran because an upstream task failed.
    Skipped,
    /// Never ran because the run was cancelled.
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
