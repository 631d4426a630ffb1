// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Workflow file exactly as deserialized from TOML.
///
/// ```toml
/// [config]
/// max_parallel = 4
/// default_shell = "bash"
///
/// [shell.zsh]
/// program = "zsh"
/// args = ["-c"]
///
/// [[task]]
/// id = "fetch"
/// run = "cargo fetch"
///
/// [[task]]
/// id = "build"
/// run = "cargo build"
/// depends_on = ["fetch"]
/// timeout = "10m"
/// ```
///
/// Tasks are an array of tables so that file order is kept; it becomes the
/// workflow's registration order.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawWorkflowFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Extra shells from `[shell.<name>]`, added to the built-in registry.
    #[serde(default)]
    pub shell: BTreeMap<String, ShellConfig>,

    /// All tasks from `[[task]]`, in file order.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated workflow file.
///
/// Obtain one via `WorkflowFile::try_from(raw)` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub config: ConfigSection,
    pub shell: BTreeMap<String, ShellConfig>,
    pub task: Vec<TaskConfig>,
    /// Directory relative task `cwd`s are resolved against.
    pub base_dir: Option<PathBuf>,
}

impl WorkflowFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        shell: BTreeMap<String, ShellConfig>,
        task: Vec<TaskConfig>,
    ) -> Self {
        Self {
            config,
            shell,
            task,
            base_dir: None,
        }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Resolve a task's working directory against `base_dir`.
    pub fn resolve_cwd(&self, cwd: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if cwd.is_relative() => base.join(cwd),
            _ => cwd.to_path_buf(),
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Maximum number of tasks running at once; unlimited when absent.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Shell used by tasks without their own `shell`; defaults to `sh`
    /// (`cmd` on Windows).
    #[serde(default)]
    pub default_shell: Option<String>,
}

/// `[shell.<name>]` section: `program args... <script>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Unique task id.
    pub id: String,

    /// Script handed to the shell.
    pub run: String,

    /// Ids of tasks that must succeed before this one starts.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Shell name from the registry; falls back to `config.default_shell`.
    #[serde(default)]
    pub shell: Option<String>,

    /// Duration string (e.g. `"30s"`, `"5m"`) after which the process is
    /// killed and the task fails.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Working directory, relative to the workflow file.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}
