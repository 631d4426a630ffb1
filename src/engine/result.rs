// src/engine/result.rs

//! Aggregate outcome of one scheduler run.

use std::fmt;
use std::time::Duration;

use crate::errors::{Result, RunflowError};
use crate::exec::ActionOutput;
use crate::types::{TaskName, TaskStatus};

/// Terminal outcome of a single task.
#[derive(Debug)]
pub enum TaskOutcome {
    Succeeded(ActionOutput),
    /// The action returned an error (or panicked).
    Failed(anyhow::Error),
    /// Never ran; `caused_by` lists the failed ancestors responsible.
    Skipped { caused_by: Vec<TaskName> },
    /// Never ran because the run was cancelled first.
    Cancelled,
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Succeeded(_) => TaskStatus::Succeeded,
            TaskOutcome::Failed(_) => TaskStatus::Failed,
            TaskOutcome::Skipped { .. } => TaskStatus::Skipped,
            TaskOutcome::Cancelled => TaskStatus::Cancelled,
        }
    }
}

#[derive(Debug)]
pub struct TaskReport {
    pub id: TaskName,
    pub outcome: TaskOutcome,
    /// Wall-clock time the action ran for; `None` if it never started.
    pub elapsed: Option<Duration>,
}

impl TaskReport {
    pub fn status(&self) -> TaskStatus {
        self.outcome.status()
    }
}

/// Per-task outcomes of a run, in workflow registration order.
#[derive(Debug, Default)]
pub struct RunResult {
    reports: Vec<TaskReport>,
}

impl RunResult {
    pub fn new(reports: Vec<TaskReport>) -> Self {
        Self { reports }
    }

    /// `true` only if every task succeeded.
    pub fn is_success(&self) -> bool {
        self.reports
            .iter()
            .all(|r| matches!(r.outcome, TaskOutcome::Succeeded(_)))
    }

    pub fn reports(&self) -> &[TaskReport] {
        &self.reports
    }

    pub fn get(&self, id: &str) -> Option<&TaskReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.get(id).map(TaskReport::status)
    }

    pub fn output_of(&self, id: &str) -> Option<&ActionOutput> {
        match &self.get(id)?.outcome {
            TaskOutcome::Succeeded(output) => Some(output),
            _ => None,
        }
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.ids_with(TaskStatus::Succeeded)
    }

    /// Failed tasks with their original errors.
    pub fn failed(&self) -> Vec<(&str, &anyhow::Error)> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                TaskOutcome::Failed(err) => Some((r.id.as_str(), err)),
                _ => None,
            })
            .collect()
    }

    /// Skipped tasks with the failed ancestors that caused the skip.
    pub fn skipped(&self) -> Vec<(&str, &[TaskName])> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                TaskOutcome::Skipped { caused_by } => Some((r.id.as_str(), caused_by.as_slice())),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<&str> {
        self.ids_with(TaskStatus::Cancelled)
    }

    /// `Ok(self)` for a fully successful run, otherwise
    /// [`RunflowError::RunFailed`] with the counts.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(RunflowError::RunFailed {
            failed: self.failed().len(),
            skipped: self.skipped().len(),
            cancelled: self.cancelled().len(),
        })
    }

    fn ids_with(&self, status: TaskStatus) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| r.status() == status)
            .map(|r| r.id.as_str())
            .collect()
    }
}

/// Human-readable summary, one line per task.
impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            let elapsed = report
                .elapsed
                .map(|d| format!(" ({:.2}s)", d.as_secs_f64()))
                .unwrap_or_default();

            match &report.outcome {
                TaskOutcome::Succeeded(_) => {
                    writeln!(f, "  ok        {}{}", report.id, elapsed)?;
                }
                TaskOutcome::Failed(err) => {
                    writeln!(f, "  FAILED    {}{}: {:#}", report.id, elapsed, err)?;
                }
                TaskOutcome::Skipped { caused_by } => {
                    writeln!(f, "  skipped   {} (caused by {})", report.id, caused_by.join(", "))?;
                }
                TaskOutcome::Cancelled => {
                    writeln!(f, "  cancelled {}", report.id)?;
                }
            }
        }
        Ok(())
    }
}
