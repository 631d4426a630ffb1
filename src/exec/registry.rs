// src/exec/registry.rs

//! Explicit registry of shells that [`ShellAction`](super::ShellAction)
//! can run scripts with.
//!
//! There is no global table: the composition root (`lib::run`, or a
//! library user) builds a `ShellRegistry`, optionally registers extra
//! shells from the workflow file, and passes it to whatever constructs the
//! actions. Program names are resolved through `PATH` by the OS.

use std::collections::HashMap;

use tokio::process::Command;

/// How to invoke one shell: `program args... <script>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a command that runs `script` with this shell.
    pub fn command(&self, script: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(script);
        cmd
    }
}

#[derive(Debug, Clone)]
pub struct ShellRegistry {
    shells: HashMap<String, ShellSpec>,
    default_shell: String,
}

impl ShellRegistry {
    /// An empty registry whose default shell is `default_shell`.
    ///
    /// The default must be registered before it can be resolved.
    pub fn empty(default_shell: impl Into<String>) -> Self {
        Self {
            shells: HashMap::new(),
            default_shell: default_shell.into(),
        }
    }

    /// Registry pre-populated with the common script runtimes.
    ///
    /// The default shell is `cmd` on Windows and `sh` everywhere else.
    pub fn with_defaults() -> Self {
        let default_shell = if cfg!(windows) { "cmd" } else { "sh" };
        let mut registry = Self::empty(default_shell);

        registry.register("sh", ShellSpec::new("sh", ["-c"]));
        registry.register(
            "bash",
            ShellSpec::new("bash", ["--noprofile", "--norc", "-e", "-o", "pipefail", "-c"]),
        );
        registry.register("cmd", ShellSpec::new("cmd", ["/D", "/C"]));
        registry.register(
            "pwsh",
            ShellSpec::new("pwsh", ["-NoProfile", "-NonInteractive", "-Command"]),
        );
        registry.register(
            "powershell",
            ShellSpec::new("powershell", ["-NoProfile", "-NonInteractive", "-Command"]),
        );
        let python = if cfg!(windows) { "python" } else { "python3" };
        registry.register("python", ShellSpec::new(python, ["-c"]));
        registry.register("node", ShellSpec::new("node", ["-e"]));
        registry.register("ruby", ShellSpec::new("ruby", ["-e"]));
        registry.register("deno", ShellSpec::new("deno", ["eval"]));
        registry.register("bun", ShellSpec::new("bun", ["-e"]));
        registry.register("nu", ShellSpec::new("nu", ["-c"]));

        registry
    }

    /// Register (or replace) a shell under `name`.
    pub fn register(&mut self, name: impl Into<String>, spec: ShellSpec) {
        self.shells.insert(name.into(), spec);
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_shell = name.into();
    }

    pub fn default_shell(&self) -> &str {
        &self.default_shell
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shells.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ShellSpec> {
        self.shells.get(name)
    }

    /// Resolve `name`, falling back to the default shell when `None`.
    pub fn resolve(&self, name: Option<&str>) -> Option<&ShellSpec> {
        self.get(name.unwrap_or(&self.default_shell))
    }

    /// Registered shell names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shells.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ShellRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
