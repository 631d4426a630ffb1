// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::errors::{Result, RunflowError};
use crate::exec::ShellRegistry;

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = RunflowError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(WorkflowFile::new_unchecked(raw.config, raw.shell, raw.task))
    }
}

/// File-level checks. Duplicate ids, unknown dependencies and cycles are
/// reported by the [`Workflow`](crate::dag::Workflow) itself once built.
fn validate_raw_config(cfg: &RawWorkflowFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    validate_shells(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawWorkflowFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(RunflowError::ConfigError(
            "workflow file must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawWorkflowFile) -> Result<()> {
    if cfg.config.max_parallel == Some(0) {
        return Err(RunflowError::ConfigError(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawWorkflowFile) -> Result<()> {
    for (position, task) in cfg.task.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(RunflowError::ConfigError(format!(
                "[[task]] #{} has an empty id",
                position + 1
            )));
        }
        if task.run.trim().is_empty() {
            return Err(RunflowError::ConfigError(format!(
                "task '{}' has an empty `run`",
                task.id
            )));
        }
        if let Some(timeout) = &task.timeout {
            parse_duration(timeout).map_err(|e| {
                RunflowError::ConfigError(format!("task '{}' has invalid timeout: {}", task.id, e))
            })?;
        }
    }
    Ok(())
}

fn validate_shells(cfg: &RawWorkflowFile) -> Result<()> {
    let builtin = ShellRegistry::with_defaults();
    let known = |name: &str| builtin.contains(name) || cfg.shell.contains_key(name);

    for (name, shell) in cfg.shell.iter() {
        if shell.program.trim().is_empty() {
            return Err(RunflowError::ConfigError(format!(
                "[shell.{name}] has an empty `program`"
            )));
        }
    }

    if let Some(default) = &cfg.config.default_shell {
        if !known(default) {
            return Err(RunflowError::ConfigError(format!(
                "[config].default_shell '{default}' is not a known shell"
            )));
        }
    }

    for task in cfg.task.iter() {
        if let Some(shell) = &task.shell {
            if !known(shell) {
                return Err(RunflowError::ConfigError(format!(
                    "task '{}' uses unknown shell '{}'",
                    task.id, shell
                )));
            }
        }
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}
