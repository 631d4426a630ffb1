use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::Notify;
use runflow::exec::{Action, ActionContext, ActionFuture, ActionOutput};

/// One lifecycle event recorded by a [`ScriptedAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Started(String),
    Finished(String),
}

/// Shared, ordered record of which actions started and finished.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: LogEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Task ids in the order their actions started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Started(id) => Some(id),
                LogEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Finished(id) => Some(id),
                LogEvent::Started(_) => None,
            })
            .collect()
    }

    pub fn was_started(&self, task: &str) -> bool {
        self.started().iter().any(|t| t == task)
    }

    /// Position of `event` in the log, if it happened.
    pub fn position(&self, event: &LogEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// `true` if `earlier` finished before `later` started.
    pub fn finished_before_started(&self, earlier: &str, later: &str) -> bool {
        match (
            self.position(&LogEvent::Finished(earlier.to_string())),
            self.position(&LogEvent::Started(later.to_string())),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Highest number of actions that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        let mut running = 0usize;
        let mut max = 0usize;
        for event in self.events() {
            match event {
                LogEvent::Started(_) => {
                    running += 1;
                    max = max.max(running);
                }
                LogEvent::Finished(_) => running = running.saturating_sub(1),
            }
        }
        max
    }
}

/// What a [`ScriptedAction`] does when executed.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Return `Ok` with the given stdout.
    Succeed(Option<String>),
    /// Return an error with this message.
    Fail(String),
    /// Sleep, then succeed; returns an error early if cancelled.
    Sleep(Duration),
    /// Block until the run is cancelled, then return an error.
    WaitForCancel,
    /// Block until cancelled, then succeed anyway.
    IgnoreCancel,
    /// Block until the gate is opened, then succeed.
    Gate(Arc<Notify>),
    Panic,
}

/// Scripted [`Action`] for tests.
#[derive(Debug, Clone)]
pub struct ScriptedAction {
    behaviour: Behaviour,
    log: ExecutionLog,
}

impl ScriptedAction {
    pub fn new(behaviour: Behaviour, log: ExecutionLog) -> Self {
        Self { behaviour, log }
    }

    pub fn succeed(log: &ExecutionLog) -> Self {
        Self::new(Behaviour::Succeed(None), log.clone())
    }

    pub fn succeed_with(log: &ExecutionLog, stdout: &str) -> Self {
        Self::new(Behaviour::Succeed(Some(stdout.to_string())), log.clone())
    }

    pub fn fail(log: &ExecutionLog, message: &str) -> Self {
        Self::new(Behaviour::Fail(message.to_string()), log.clone())
    }

    pub fn sleep(log: &ExecutionLog, duration: Duration) -> Self {
        Self::new(Behaviour::Sleep(duration), log.clone())
    }

    pub fn wait_for_cancel(log: &ExecutionLog) -> Self {
        Self::new(Behaviour::WaitForCancel, log.clone())
    }

    pub fn ignore_cancel(log: &ExecutionLog) -> Self {
        Self::new(Behaviour::IgnoreCancel, log.clone())
    }

    pub fn gated(log: &ExecutionLog, gate: Arc<Notify>) -> Self {
        Self::new(Behaviour::Gate(gate), log.clone())
    }

    pub fn panic(log: &ExecutionLog) -> Self {
        Self::new(Behaviour::Panic, log.clone())
    }
}

impl Action for ScriptedAction {
    fn execute(&self, ctx: ActionContext) -> ActionFuture<'_> {
        Box::pin(async move {
            self.log.push(LogEvent::Started(ctx.task.clone()));

            let result = match &self.behaviour {
                Behaviour::Succeed(stdout) => Ok(ActionOutput {
                    stdout: stdout.clone(),
                }),
                Behaviour::Fail(message) => Err(anyhow!("{message}")),
                Behaviour::Sleep(duration) => {
                    tokio::select! {
                        _ = tokio::time::sleep(*duration) => Ok(ActionOutput::empty()),
                        _ = ctx.cancel.cancelled() => Err(anyhow!("{} cancelled while sleeping", ctx.task)),
                    }
                }
                Behaviour::WaitForCancel => {
                    ctx.cancel.cancelled().await;
                    Err(anyhow!("{} cancelled", ctx.task))
                }
                Behaviour::IgnoreCancel => {
                    ctx.cancel.cancelled().await;
                    Ok(ActionOutput::empty())
                }
                Behaviour::Gate(gate) => {
                    gate.notified().await;
                    Ok(ActionOutput::empty())
                }
                Behaviour::Panic => panic!("scripted panic in {}", ctx.task),
            };

            self.log.push(LogEvent::Finished(ctx.task.clone()));
            result
        })
    }
}
