// src/exec/action.rs

//! The unit of work a task runs.
//!
//! The scheduler only ever talks to an [`Action`]; it does not know whether
//! the action spawns a process ([`ShellAction`](super::ShellAction)), calls
//! into an SDK, or is a closure in a test.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::types::TaskName;

/// Future returned by [`Action::execute`].
pub type ActionFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<ActionOutput>> + Send + 'a>>;

/// Trait abstracting how a task's work is executed.
///
/// Implementations must be shareable across threads: the same action may be
/// read concurrently while the scheduler dispatches other tasks. Retrying and
/// timeouts are the action's own business; the scheduler never retries.
pub trait Action: Send + Sync {
    /// Run the action once.
    ///
    /// An `Err` marks the task `Failed`. Long-running actions should watch
    /// `ctx.cancel` and return early when it fires.
    fn execute(&self, ctx: ActionContext) -> ActionFuture<'_>;
}

/// Per-invocation context handed to an [`Action`].
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Id of the task being executed.
    pub task: TaskName,
    /// Fires when the run is cancelled.
    pub cancel: CancellationToken,
}

impl ActionContext {
    pub fn new(task: impl Into<TaskName>, cancel: CancellationToken) -> Self {
        Self {
            task: task.into(),
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Optional output data produced by an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutput {
    pub stdout: Option<String>,
}

impl ActionOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
        }
    }
}

/// Adapter turning an async closure into an [`Action`].
pub struct FnAction<F> {
    f: F,
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").finish_non_exhaustive()
    }
}

impl<F, Fut> Action for FnAction<F>
where
    F: Fn(ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ActionOutput>> + Send + 'static,
{
    fn execute(&self, ctx: ActionContext) -> ActionFuture<'_> {
        Box::pin((self.f)(ctx))
    }
}

/// Build an [`Action`] from a closure returning a future.
///
/// ```
/// use runflow::exec::{action_fn, ActionOutput};
///
/// let action = action_fn(|ctx| async move {
///     Ok(ActionOutput::with_stdout(format!("hello from {}", ctx.task)))
/// });
/// # let _ = action;
/// ```
pub fn action_fn<F, Fut>(f: F) -> FnAction<F>
where
    F: Fn(ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ActionOutput>> + Send + 'static,
{
    FnAction { f }
}
