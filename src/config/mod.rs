// src/config/mod.rs

//! Workflow files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workflow file from disk (`loader.rs`).
//! - Validate file-level invariants like timeouts and shell names
//!   (`validate.rs`).
//! - Build the shell registry and the [`Workflow`](crate::dag::Workflow)
//!   from a validated file (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{LoadedWorkflow, load_and_validate, load_from_path, load_workflow};
pub use model::{ConfigSection, RawWorkflowFile, ShellConfig, TaskConfig, WorkflowFile};
pub use validate::parse_duration;
