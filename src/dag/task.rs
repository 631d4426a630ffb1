// src/dag/task.rs

//! Immutable task description: id, dependency set, and action.

use std::fmt;
use std::sync::Arc;

use crate::exec::{Action, ActionContext, ActionFuture};
use crate::types::TaskName;

/// One unit of work in a [`Workflow`](crate::dag::Workflow).
///
/// A `Task` never changes after construction, so it can be shared freely
/// between the scheduler and running actions. Cloning is cheap: the action
/// is reference counted.
#[derive(Clone)]
pub struct Task {
    id: TaskName,
    /// Direct dependencies, deduplicated, in declaration order.
    depends_on: Vec<TaskName>,
    action: Arc<dyn Action>,
}

impl Task {
    pub fn new(id: impl Into<TaskName>, action: impl Action + 'static) -> Self {
        Self::from_shared(id, Arc::new(action))
    }

    /// Like [`Task::new`], for an action that is already shared.
    pub fn from_shared(id: impl Into<TaskName>, action: Arc<dyn Action>) -> Self {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            action,
        }
    }

    /// Add one dependency. Repeated ids are ignored.
    pub fn depends_on(mut self, dep: impl Into<TaskName>) -> Self {
        let dep = dep.into();
        if !self.depends_on.contains(&dep) {
            self.depends_on.push(dep);
        }
        self
    }

    /// Add several dependencies. Repeated ids are ignored.
    pub fn depends_on_all<I, S>(self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        deps.into_iter().fold(self, |task, dep| task.depends_on(dep))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.depends_on
    }

    pub fn action(&self) -> &Arc<dyn Action> {
        &self.action
    }

    /// Run this task's action once.
    pub fn execute(&self, ctx: ActionContext) -> ActionFuture<'_> {
        self.action.execute(ctx)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
