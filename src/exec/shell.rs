// src/exec/shell.rs

//! Action that runs a script through a shell process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::action::{Action, ActionContext, ActionFuture, ActionOutput};
use crate::exec::registry::ShellSpec;

/// Runs `script` with a [`ShellSpec`] and captures its stdout.
///
/// - Exit status 0 is success; anything else is an error carrying the code.
/// - On cancellation, or when the optional `timeout` elapses, the child is
///   killed and the action returns an error.
#[derive(Debug, Clone)]
pub struct ShellAction {
    shell: ShellSpec,
    script: String,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl ShellAction {
    pub fn new(shell: ShellSpec, script: impl Into<String>) -> Self {
        Self {
            shell,
            script: script.into(),
            cwd: None,
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn shell(&self) -> &ShellSpec {
        &self.shell
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn run(&self, ctx: ActionContext) -> Result<ActionOutput> {
        info!(
            task = %ctx.task,
            shell = %self.shell.program,
            script = %self.script,
            "starting task process"
        );

        let mut cmd = self.shell.command(&self.script);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", ctx.task))?;

        let stdout = child
            .stdout
            .take()
            .map(|out| spawn_stdout_collector(ctx.task.clone(), out));

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let task_name = ctx.task.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                }
            });
        }

        let deadline = async {
            match self.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let status = tokio::select! {
            status_res = child.wait() => {
                status_res.with_context(|| {
                    format!("waiting for process of task '{}'", ctx.task)
                })?
            }

            _ = ctx.cancel.cancelled() => {
                info!(task = %ctx.task, "cancellation requested; killing process");
                kill_child(&mut child, &ctx.task).await;
                bail!("task '{}' was cancelled", ctx.task);
            }

            _ = deadline => {
                warn!(task = %ctx.task, timeout = ?self.timeout, "task timed out; killing process");
                kill_child(&mut child, &ctx.task).await;
                bail!("task '{}' timed out after {:?}", ctx.task, self.timeout.unwrap_or_default());
            }
        };

        let captured = match stdout {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        let code = status.code().unwrap_or(-1);
        info!(
            task = %ctx.task,
            exit_code = code,
            success = status.success(),
            "task process exited"
        );

        if !status.success() {
            bail!("task '{}' exited with code {}", ctx.task, code);
        }

        Ok(ActionOutput {
            stdout: Some(captured),
        })
    }
}

impl Action for ShellAction {
    fn execute(&self, ctx: ActionContext) -> ActionFuture<'_> {
        Box::pin(self.run(ctx))
    }
}

/// Read stdout line by line, logging each line and returning the whole text.
fn spawn_stdout_collector(task: String, stdout: ChildStdout) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut captured = String::new();
        let mut lines = BufReader::new(stdout).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            info!(task = %task, "stdout: {}", line);
            captured.push_str(&line);
            captured.push('\n');
        }

        captured
    })
}

async fn kill_child(child: &mut Child, task: &str) {
    if let Err(e) = child.kill().await {
        warn!(task = %task, error = %e, "failed to kill child process");
    }
}
