// src/engine/state.rs

//! Per-run state table for the scheduler.
//!
//! `RunState` is synchronous and deterministic: it owns every status
//! transition of one run, and the async shell in
//! [`scheduler`](super::scheduler) is its only writer. It can be driven
//! step by step in tests without Tokio, channels or processes.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::dag::GraphIndex;
use crate::engine::step::SchedulerStep;
use crate::types::{TaskName, TaskStatus};

#[derive(Debug)]
pub struct RunState<'g> {
    graph: &'g GraphIndex,
    status: Vec<TaskStatus>,
    /// Number of dependencies that have not yet succeeded.
    outstanding: Vec<usize>,
    /// Ready tasks, ordered by registration index.
    ready: BTreeSet<usize>,
    /// Failed ancestors responsible for each skipped task.
    skip_causes: Vec<Vec<usize>>,
    running: usize,
    cancelled: bool,
}

impl<'g> RunState<'g> {
    /// Fresh state: tasks without dependencies are `Ready`, the rest
    /// `Pending`.
    pub fn new(graph: &'g GraphIndex) -> Self {
        let n = graph.len();
        let outstanding: Vec<usize> = (0..n).map(|i| graph.dependency_indices(i).len()).collect();

        let mut status = vec![TaskStatus::Pending; n];
        let mut ready = BTreeSet::new();
        for (i, &count) in outstanding.iter().enumerate() {
            if count == 0 {
                status[i] = TaskStatus::Ready;
                ready.insert(i);
            }
        }

        Self {
            graph,
            status,
            outstanding,
            ready,
            skip_causes: vec![Vec::new(); n],
            running: 0,
            cancelled: false,
        }
    }

    pub fn graph(&self) -> &'g GraphIndex {
        self.graph
    }

    pub fn status(&self, index: usize) -> TaskStatus {
        self.status[index]
    }

    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.graph.index_of(task).map(|i| self.status[i])
    }

    /// Failed ancestors that caused `index` to be skipped, in registration
    /// order of when they were observed.
    pub fn skip_causes(&self, index: usize) -> &[usize] {
        &self.skip_causes[index]
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// `true` once every task is in a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status.iter().all(|s| s.is_terminal())
    }

    /// Move Ready tasks to Running, lowest registration index first.
    ///
    /// `limit` caps the number of tasks running at once; `None` means no
    /// cap. Returns the indices that should be started now. Nothing is
    /// dispatched after [`cancel`](Self::cancel).
    pub fn dispatch(&mut self, limit: Option<usize>) -> Vec<usize> {
        if self.cancelled {
            return Vec::new();
        }

        let free = match limit {
            Some(max) => max.saturating_sub(self.running),
            None => self.ready.len(),
        };

        let picked: Vec<usize> = self.ready.iter().take(free).copied().collect();
        for &index in &picked {
            self.ready.remove(&index);
            self.status[index] = TaskStatus::Running;
            self.running += 1;
            debug!(task = %self.graph.id(index), "dependencies satisfied; marking Running");
        }

        picked
    }

    /// Record that the action of a running task finished.
    ///
    /// On success, direct dependents whose last outstanding dependency this
    /// was become Ready. On failure, every transitive dependent that has
    /// not started is Skipped with this task as its cause. After
    /// [`cancel`](Self::cancel) every completion counts as a failure: the
    /// task was running when its context was cancelled.
    pub fn complete(&mut self, index: usize, success: bool) -> SchedulerStep {
        if self.status[index] != TaskStatus::Running {
            warn!(
                task = %self.graph.id(index),
                status = %self.status[index],
                "completion for task that is not running; ignoring"
            );
            return SchedulerStep::default();
        }

        self.running -= 1;
        let mut step = SchedulerStep::default();

        if success && !self.cancelled {
            self.status[index] = TaskStatus::Succeeded;
            step.newly_ready = self.release_dependents(index);
        } else {
            self.status[index] = TaskStatus::Failed;
            step.newly_skipped = self.skip_dependents(index);
        }

        step.run_just_finished = self.is_finished();
        step
    }

    /// Cancel the run: every task that has not started becomes `Cancelled`.
    ///
    /// Running tasks are left alone; they are expected to observe the
    /// cancellation signal and complete on their own, and end `Failed`
    /// whatever their action returns. Returns the ids that were cancelled
    /// here.
    pub fn cancel(&mut self) -> Vec<TaskName> {
        self.cancelled = true;
        self.ready.clear();

        let mut cancelled = Vec::new();
        for (i, status) in self.status.iter_mut().enumerate() {
            if matches!(status, TaskStatus::Pending | TaskStatus::Ready) {
                *status = TaskStatus::Cancelled;
                cancelled.push(self.graph.id(i).to_string());
            }
        }
        cancelled
    }

    fn release_dependents(&mut self, index: usize) -> Vec<TaskName> {
        let mut newly_ready = Vec::new();

        for &dependent in self.graph.dependent_indices(index) {
            self.outstanding[dependent] = self.outstanding[dependent].saturating_sub(1);

            if self.outstanding[dependent] == 0 && self.status[dependent] == TaskStatus::Pending {
                self.status[dependent] = TaskStatus::Ready;
                self.ready.insert(dependent);
                newly_ready.push(self.graph.id(dependent).to_string());
            }
        }

        newly_ready
    }

    /// Skip every not-yet-started transitive dependent of `failed`.
    ///
    /// Dependents that were already skipped by an earlier failure gain
    /// `failed` as an additional cause.
    fn skip_dependents(&mut self, failed: usize) -> Vec<TaskName> {
        let mut newly_skipped = Vec::new();
        let mut visited = vec![false; self.graph.len()];
        let mut stack: Vec<usize> = self.graph.dependent_indices(failed).to_vec();

        while let Some(index) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;

            match self.status[index] {
                TaskStatus::Pending => {
                    self.status[index] = TaskStatus::Skipped;
                    self.skip_causes[index].push(failed);
                    debug!(
                        task = %self.graph.id(index),
                        cause = %self.graph.id(failed),
                        "skipping task due to upstream failure"
                    );
                    newly_skipped.push(index);
                }
                TaskStatus::Skipped => {
                    if !self.skip_causes[index].contains(&failed) {
                        self.skip_causes[index].push(failed);
                    }
                }
                // Ready/Running cannot follow a failed dependency; terminal
                // states stay as they are.
                _ => continue,
            }

            stack.extend_from_slice(self.graph.dependent_indices(index));
        }

        newly_skipped.sort_unstable();
        newly_skipped
            .into_iter()
            .map(|i| self.graph.id(i).to_string())
            .collect()
    }
}
