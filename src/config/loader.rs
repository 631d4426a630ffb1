// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::dag::Workflow;
use crate::engine::SchedulerOptions;
use crate::errors::Result;

/// Everything needed to run a workflow file.
#[derive(Debug, Clone)]
pub struct LoadedWorkflow {
    pub workflow: Workflow,
    pub options: SchedulerOptions,
}

/// Load a workflow file and return the raw `RawWorkflowFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawWorkflowFile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a workflow file and run the file-level checks.
///
/// Relative task `cwd`s will be resolved against the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let file = WorkflowFile::try_from(raw)?.with_base_dir(file_dir(path));
    Ok(file)
}

/// Load, validate, and build the workflow, then check it is a valid DAG.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_workflow(path: impl AsRef<Path>) -> Result<LoadedWorkflow> {
    let path = path.as_ref();
    let file = load_and_validate(path)?;
    let registry = file.shell_registry();
    let workflow = file.build_workflow(&registry)?;
    workflow.validate()?;

    info!(
        path = %path.display(),
        tasks = workflow.len(),
        default_shell = registry.default_shell(),
        "loaded workflow"
    );

    Ok(LoadedWorkflow {
        workflow,
        options: file.scheduler_options(),
    })
}

/// Directory containing `path`, or `.` for a bare file name.
fn file_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
