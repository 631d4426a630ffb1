// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`action`] defines the [`Action`] trait the scheduler invokes, its
//!   per-invocation [`ActionContext`], and a closure adapter.
//! - [`shell`] provides [`ShellAction`], which runs a script in a child
//!   process using `tokio::process::Command`.
//! - [`registry`] holds the explicit [`ShellRegistry`] that maps shell names
//!   (`sh`, `bash`, `pwsh`, ...) to the program and arguments used to run a
//!   script.

pub mod action;
pub mod registry;
pub mod shell;

pub use action::{Action, ActionContext, ActionFuture, ActionOutput, FnAction, action_fn};
pub use registry::{ShellRegistry, ShellSpec};
pub use shell::ShellAction;
