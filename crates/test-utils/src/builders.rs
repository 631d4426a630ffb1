#![allow(dead_code)]

use runflow::dag::{Task, Workflow};

use crate::fake_action::{ExecutionLog, ScriptedAction};

/// Builder for `Workflow` to simplify test setup.
///
/// Every task added through the builder shares one [`ExecutionLog`], so a
/// test can assert on start/finish ordering after a run.
pub struct WorkflowBuilder {
    workflow: Workflow,
    log: ExecutionLog,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            workflow: Workflow::new(),
            log: ExecutionLog::new(),
        }
    }

    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }

    /// Add a task that succeeds immediately.
    pub fn task(self, id: &str, deps: &[&str]) -> Self {
        let action = ScriptedAction::succeed(&self.log);
        self.with_action(id, deps, action)
    }

    /// Add a task that fails with `message`.
    pub fn failing_task(self, id: &str, deps: &[&str], message: &str) -> Self {
        let action = ScriptedAction::fail(&self.log, message);
        self.with_action(id, deps, action)
    }

    pub fn with_action(mut self, id: &str, deps: &[&str], action: ScriptedAction) -> Self {
        let task = Task::new(id, action).depends_on_all(deps.iter().copied());
        self.workflow
            .add_task(task)
            .expect("WorkflowBuilder: duplicate task id");
        self
    }

    pub fn build(self) -> Workflow {
        self.workflow
    }

    /// Build and also hand back the shared execution log.
    pub fn build_with_log(self) -> (Workflow, ExecutionLog) {
        (self.workflow, self.log)
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Workflow of always-succeeding tasks from `(id, deps)` pairs, in order.
pub fn workflow_from_edges(edges: &[(&str, &[&str])]) -> Workflow {
    edges
        .iter()
        .fold(WorkflowBuilder::new(), |b, (id, deps)| b.task(id, deps))
        .build()
}

/// Ids of `tasks`, in order.
pub fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(Task::id).collect()
}
