// src/dag/workflow.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::dag::cycle::check_acyclic;
use crate::dag::graph::GraphIndex;
use crate::dag::task::Task;
use crate::errors::{Result, RunflowError};
use crate::types::TaskName;

/// An ordered, owned collection of [`Task`]s.
///
/// Iteration order is registration order; it is the tie-break for every
/// deterministic listing, log line and cycle report.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    tasks: Vec<Task>,
    positions: HashMap<TaskName, usize>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    ///
    /// Fails with [`RunflowError::DuplicateTask`] if the id is taken; the
    /// workflow is left unchanged in that case.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.positions.contains_key(task.id()) {
            return Err(RunflowError::DuplicateTask(task.id().to_string()));
        }

        debug!(task = %task.id(), deps = ?task.dependencies(), "registered task");
        self.positions.insert(task.id().to_string(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Register several tasks at once, in iteration order.
    ///
    /// All or nothing: if any id is already registered or repeats within
    /// the batch, no task is added.
    pub fn add_tasks(&mut self, tasks: impl IntoIterator<Item = Task>) -> Result<()> {
        let batch: Vec<Task> = tasks.into_iter().collect();

        let mut seen: HashSet<&str> = HashSet::new();
        for task in &batch {
            if self.positions.contains_key(task.id()) || !seen.insert(task.id()) {
                return Err(RunflowError::DuplicateTask(task.id().to_string()));
            }
        }

        for task in batch {
            self.add_task(task)?;
        }
        Ok(())
    }

    /// All tasks in registration order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.positions.get(id).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Build the adjacency index, checking that every dependency exists.
    pub fn graph(&self) -> Result<GraphIndex> {
        GraphIndex::build(&self.tasks)
    }

    /// Check that the workflow is a valid DAG.
    ///
    /// Unknown dependency references are reported before cycles. The cycle
    /// error lists every task on any cycle. Validation has no side effects,
    /// so repeated calls on an unchanged workflow give the same answer.
    pub fn validate(&self) -> Result<()> {
        self.validated_graph().map(|_| ())
    }

    /// [`validate`](Self::validate), returning the graph on success.
    pub fn validated_graph(&self) -> Result<GraphIndex> {
        let graph = self.graph()?;
        check_acyclic(&graph)?;
        debug!(tasks = graph.len(), "workflow validated");
        Ok(graph)
    }

    /// A new workflow holding only `targets` and everything they
    /// transitively depend on, in the original registration order.
    ///
    /// Fails with [`RunflowError::TaskNotFound`] for an unknown target.
    pub fn select<S: AsRef<str>>(&self, targets: &[S]) -> Result<Workflow> {
        let graph = self.graph()?;
        let mut keep = vec![false; graph.len()];

        for target in targets {
            let target = target.as_ref();
            let Some(index) = graph.index_of(target) else {
                return Err(RunflowError::TaskNotFound(target.to_string()));
            };
            keep[index] = true;
            for dep in graph.transitive_dependencies(index) {
                keep[dep] = true;
            }
        }

        let mut selected = Workflow::new();
        for (task, _) in self.tasks.iter().zip(keep).filter(|(_, k)| *k) {
            selected.add_task(task.clone())?;
        }

        info!(
            targets = ?targets.iter().map(|t| t.as_ref()).collect::<Vec<_>>(),
            selected = selected.len(),
            total = self.len(),
            "selected workflow subgraph"
        );
        Ok(selected)
    }
}

/// [`Workflow::list`] for a workflow that may be absent.
pub fn list_tasks(workflow: Option<&Workflow>) -> &[Task] {
    workflow.map(Workflow::list).unwrap_or(&[])
}
