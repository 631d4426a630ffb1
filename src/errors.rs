// src/errors.rs

//! Crate-wide error types and the `Result` alias.

use std::fmt;

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug)]
pub enum RunflowError {
    /// A task with this id is already registered in the workflow.
    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskName),

    /// `task` lists `dependency` in `depends_on`, but no such task exists.
    #[error("Unknown task: '{task}' depends on '{dependency}', which is not defined")]
    UnknownTask {
        task: TaskName,
        dependency: TaskName,
    },

    /// A task id requested by the caller does not exist in the workflow.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskName),

    #[error(transparent)]
    CyclicalReference(#[from] CyclicalReferenceError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Workflow run failed: {failed} failed, {skipped} skipped, {cancelled} cancelled")]
    RunFailed {
        failed: usize,
        skipped: usize,
        cancelled: usize,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Every task that participates in at least one dependency cycle.
///
/// `tasks` is ordered by workflow registration order and covers all
/// cycles in the graph, not only the first one found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct CyclicalReferenceError {
    pub tasks: Vec<TaskName>,
}

impl CyclicalReferenceError {
    pub fn contains(&self, task: &str) -> bool {
        self.tasks.iter().any(|t| t == task)
    }
}

impl fmt::Display for CyclicalReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cyclical references found in tasks:")?;
        for task in &self.tasks {
            writeln!(f, " - {task}")?;
        }
        Ok(())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunflowError>;
