// src/config/build.rs

//! Turn a validated [`WorkflowFile`] into runnable pieces: the shell
//! registry, the [`Workflow`] of shell tasks, and scheduler options.

use std::num::NonZeroUsize;

use tracing::debug;

use crate::config::model::{TaskConfig, WorkflowFile};
use crate::config::validate::parse_duration;
use crate::dag::{Task, Workflow};
use crate::engine::SchedulerOptions;
use crate::errors::{Result, RunflowError};
use crate::exec::{ShellAction, ShellRegistry, ShellSpec};

impl WorkflowFile {
    /// Built-in shells plus the file's `[shell.<name>]` entries, with the
    /// file's default shell applied.
    pub fn shell_registry(&self) -> ShellRegistry {
        let mut registry = ShellRegistry::with_defaults();
        for (name, shell) in self.shell.iter() {
            registry.register(name.clone(), ShellSpec::new(&shell.program, &shell.args));
        }
        if let Some(default) = &self.config.default_shell {
            registry.set_default(default.clone());
        }
        registry
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_parallel: self.config.max_parallel.and_then(NonZeroUsize::new),
        }
    }

    /// Register one [`ShellAction`] task per `[[task]]`, in file order.
    ///
    /// Fails with [`RunflowError::DuplicateTask`] on a repeated id. The
    /// result is not yet validated as a DAG.
    pub fn build_workflow(&self, registry: &ShellRegistry) -> Result<Workflow> {
        let mut workflow = Workflow::new();
        for task in self.task.iter() {
            let action = self.shell_action(task, registry)?;
            workflow.add_task(Task::new(task.id.clone(), action).depends_on_all(&task.depends_on))?;
        }
        debug!(tasks = workflow.len(), "built workflow from file");
        Ok(workflow)
    }

    fn shell_action(&self, task: &TaskConfig, registry: &ShellRegistry) -> Result<ShellAction> {
        let shell = registry.resolve(task.shell.as_deref()).ok_or_else(|| {
            RunflowError::ConfigError(format!(
                "task '{}' uses unknown shell '{}'",
                task.id,
                task.shell.as_deref().unwrap_or(registry.default_shell())
            ))
        })?;

        let mut action = ShellAction::new(shell.clone(), task.run.clone());
        if let Some(cwd) = &task.cwd {
            action = action.with_cwd(self.resolve_cwd(cwd));
        }
        for (key, value) in task.env.iter() {
            action = action.with_env(key.clone(), value.clone());
        }
        if let Some(timeout) = &task.timeout {
            let timeout = parse_duration(timeout).map_err(|e| {
                RunflowError::ConfigError(format!("task '{}' has invalid timeout: {}", task.id, e))
            })?;
            action = action.with_timeout(timeout);
        }
        Ok(action)
    }
}
