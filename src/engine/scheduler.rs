// src/engine/scheduler.rs

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dag::{Task, Workflow};
use crate::errors::Result;
use crate::exec::{ActionContext, ActionOutput};
use crate::types::TaskStatus;

use super::result::{RunResult, TaskOutcome, TaskReport};
use super::state::RunState;
use super::RuntimeEvent;

/// Tuning knobs for a [`Scheduler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerOptions {
    /// Maximum number of actions running at once. `None` runs every Ready
    /// task immediately.
    pub max_parallel: Option<NonZeroUsize>,
}

/// Executes a workflow's tasks in dependency order.
///
/// This is the async IO shell around [`RunState`]: it spawns actions on the
/// Tokio runtime, funnels their completions back through a channel, and
/// feeds them into the state table one at a time, so all status
/// transitions are serialized through this loop.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    options: SchedulerOptions,
}

/// Where a finished action's result is kept until the report is built.
#[derive(Default)]
struct Finished {
    result: Option<anyhow::Result<ActionOutput>>,
    elapsed: Option<Duration>,
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    /// Scheduler running at most `max` actions concurrently (`0` means
    /// unlimited).
    pub fn with_max_parallel(max: usize) -> Self {
        Self::new(SchedulerOptions {
            max_parallel: NonZeroUsize::new(max),
        })
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Run every task of `workflow` once.
    ///
    /// The workflow is validated first; an invalid workflow is returned as
    /// an error before anything runs. Action failures never surface as an
    /// `Err`: they are recorded in the returned [`RunResult`] and only skip
    /// the failed task's dependents.
    ///
    /// When `cancel` fires, tasks that have not started are reported as
    /// cancelled and running actions see the signal through their
    /// [`ActionContext`]. The run returns once those actions finish.
    pub async fn run(&self, workflow: &Workflow, cancel: CancellationToken) -> Result<RunResult> {
        let graph = workflow.validated_graph()?;
        let tasks = workflow.list();
        let limit = self.options.max_parallel.map(NonZeroUsize::get);

        let mut state = RunState::new(&graph);
        let mut finished: Vec<Finished> = (0..tasks.len()).map(|_| Finished::default()).collect();

        // Every task sends exactly one event, so this never blocks.
        let (event_tx, mut event_rx) = mpsc::channel::<RuntimeEvent>(tasks.len().max(1));

        info!(tasks = tasks.len(), max_parallel = ?limit, "workflow run started");

        if cancel.is_cancelled() {
            let cancelled = state.cancel();
            warn!(?cancelled, "run cancelled before it started");
        }
        self.dispatch_ready(&mut state, tasks, &event_tx, &cancel);

        while !state.is_finished() {
            tokio::select! {
                biased;

                _ = cancel.cancelled(), if !state.is_cancelled() => {
                    let cancelled = state.cancel();
                    warn!(
                        ?cancelled,
                        running = state.running_count(),
                        "run cancelled; waiting for running tasks to stop"
                    );
                }

                Some(event) = event_rx.recv() => {
                    self.handle_event(&mut state, &mut finished, event);
                }

                else => {
                    warn!("runtime event channel closed before the run finished");
                    break;
                }
            }

            self.dispatch_ready(&mut state, tasks, &event_tx, &cancel);
        }

        let result = build_result(&state, finished);
        info!(
            succeeded = result.succeeded().len(),
            failed = result.failed().len(),
            skipped = result.skipped().len(),
            cancelled = result.cancelled().len(),
            "workflow run finished"
        );
        Ok(result)
    }

    fn handle_event(&self, state: &mut RunState<'_>, finished: &mut [Finished], event: RuntimeEvent) {
        match event {
            RuntimeEvent::TaskCompleted {
                index,
                result,
                elapsed,
            } => {
                let task = state.graph().id(index).to_string();

                // The context was cancelled while this task ran; it cannot
                // count as a success.
                let result = match result {
                    Ok(_) if state.is_cancelled() => {
                        Err(anyhow!("task '{task}' was cancelled while running"))
                    }
                    other => other,
                };

                let step = match &result {
                    Ok(_) => {
                        info!(task = %task, ?elapsed, "task succeeded");
                        state.complete(index, true)
                    }
                    Err(err) => {
                        warn!(task = %task, ?elapsed, error = %err, "task failed; skipping dependents");
                        state.complete(index, false)
                    }
                };

                if !step.newly_skipped.is_empty() {
                    info!(task = %task, skipped = ?step.newly_skipped, "dependents skipped");
                }
                if !step.newly_ready.is_empty() {
                    debug!(task = %task, ready = ?step.newly_ready, "dependents ready");
                }

                finished[index] = Finished {
                    result: Some(result),
                    elapsed: Some(elapsed),
                };
            }
        }
    }

    fn dispatch_ready(
        &self,
        state: &mut RunState<'_>,
        tasks: &[Task],
        event_tx: &mpsc::Sender<RuntimeEvent>,
        cancel: &CancellationToken,
    ) {
        let limit = self.options.max_parallel.map(NonZeroUsize::get);
        for index in state.dispatch(limit) {
            let task = &tasks[index];
            info!(task = %task.id(), "starting task");
            spawn_task(index, task, event_tx.clone(), cancel.child_token());
        }
    }
}

/// Run one task's action on its own Tokio task and report back.
///
/// The action runs in a nested task so that a panic is caught as a
/// `JoinError` and reported as a failure instead of losing the event.
fn spawn_task(
    index: usize,
    task: &Task,
    event_tx: mpsc::Sender<RuntimeEvent>,
    cancel: CancellationToken,
) {
    let action = Arc::clone(task.action());
    let ctx = ActionContext::new(task.id(), cancel);
    let name = task.id().to_string();

    tokio::spawn(async move {
        let started = Instant::now();
        let handle = tokio::spawn(async move { action.execute(ctx).await });

        let result = match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow!("task '{name}' panicked: {join_err}")),
        };

        let event = RuntimeEvent::TaskCompleted {
            index,
            result,
            elapsed: started.elapsed(),
        };
        if event_tx.send(event).await.is_err() {
            debug!(task = %name, "scheduler gone before task completion was reported");
        }
    });
}

fn build_result(state: &RunState<'_>, finished: Vec<Finished>) -> RunResult {
    let graph = state.graph();

    let reports = finished
        .into_iter()
        .enumerate()
        .map(|(index, done)| {
            let outcome = match (state.status(index), done.result) {
                (TaskStatus::Succeeded, Some(Ok(output))) => TaskOutcome::Succeeded(output),
                (TaskStatus::Failed, Some(Err(err))) => TaskOutcome::Failed(err),
                (TaskStatus::Skipped, _) => TaskOutcome::Skipped {
                    caused_by: state
                        .skip_causes(index)
                        .iter()
                        .map(|&i| graph.id(i).to_string())
                        .collect(),
                },
                // Only reachable if the event loop stopped early; nothing
                // further will run for these tasks.
                _ => TaskOutcome::Cancelled,
            };

            TaskReport {
                id: graph.id(index).to_string(),
                outcome,
                elapsed: done.elapsed,
            }
        })
        .collect();

    RunResult::new(reports)
}
