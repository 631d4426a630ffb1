// src/dag/graph.rs

use std::collections::HashMap;

use tracing::debug;

use crate::dag::task::Task;
use crate::errors::{Result, RunflowError};
use crate::types::TaskName;

/// Read-only adjacency index over a workflow's tasks.
///
/// Task ids are mapped to dense indices in registration order, so index
/// order doubles as the deterministic tie-break everywhere. Built once per
/// validation / run and never mutated afterwards, which makes it safe to
/// share for concurrent reads.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    ids: Vec<TaskName>,
    index: HashMap<TaskName, usize>,
    /// `deps[i]`: tasks that `i` depends on.
    deps: Vec<Vec<usize>>,
    /// `dependents[i]`: tasks that depend on `i`, in registration order.
    dependents: Vec<Vec<usize>>,
}

impl GraphIndex {
    /// Build the index from tasks in registration order.
    ///
    /// Fails with [`RunflowError::UnknownTask`] on the first dependency (in
    /// registration order) that names a task not in `tasks`. Self
    /// dependencies are kept as edges; the cycle detector reports them.
    pub fn build(tasks: &[Task]) -> Result<Self> {
        let ids: Vec<TaskName> = tasks.iter().map(|t| t.id().to_string()).collect();
        let index: HashMap<TaskName, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut deps = Vec::with_capacity(tasks.len());
        let mut dependents = vec![Vec::new(); tasks.len()];

        for (i, task) in tasks.iter().enumerate() {
            let mut task_deps = Vec::with_capacity(task.dependencies().len());
            for dep in task.dependencies() {
                let Some(&d) = index.get(dep) else {
                    return Err(RunflowError::UnknownTask {
                        task: task.id().to_string(),
                        dependency: dep.clone(),
                    });
                };
                task_deps.push(d);
                dependents[d].push(i);
            }
            deps.push(task_deps);
        }

        debug!(
            tasks = ids.len(),
            edges = deps.iter().map(Vec::len).sum::<usize>(),
            "built task graph index"
        );

        Ok(Self {
            ids,
            index,
            deps,
            dependents,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Id of the task at `index`.
    ///
    /// Panics if `index` is out of range.
    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// All task ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Direct dependencies of `id`. Empty for unknown ids.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.names(self.index_of(id).map(|i| self.deps[i].as_slice()))
    }

    /// Direct dependents of `id` (reverse adjacency). Empty for unknown ids.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.names(self.index_of(id).map(|i| self.dependents[i].as_slice()))
    }

    pub fn dependency_indices(&self, index: usize) -> &[usize] {
        &self.deps[index]
    }

    pub fn dependent_indices(&self, index: usize) -> &[usize] {
        &self.dependents[index]
    }

    /// Every task reachable downstream of `index`, excluding `index` itself
    /// unless it sits on a cycle. Sorted by registration order.
    pub fn transitive_dependents(&self, index: usize) -> Vec<usize> {
        self.closure(index, |i| self.dependents[i].as_slice())
    }

    /// Every task `index` transitively depends on. Sorted by registration
    /// order.
    pub fn transitive_dependencies(&self, index: usize) -> Vec<usize> {
        self.closure(index, |i| self.deps[i].as_slice())
    }

    fn closure<'a>(&'a self, start: usize, next: impl Fn(usize) -> &'a [usize]) -> Vec<usize> {
        let mut seen = vec![false; self.len()];
        let mut stack: Vec<usize> = next(start).to_vec();

        while let Some(i) = stack.pop() {
            if seen[i] {
                continue;
            }
            seen[i] = true;
            stack.extend_from_slice(next(i));
        }

        seen.iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
            .collect()
    }

    fn names(&self, indices: Option<&[usize]>) -> Vec<&str> {
        indices
            .unwrap_or(&[])
            .iter()
            .map(|&i| self.ids[i].as_str())
            .collect()
    }
}
