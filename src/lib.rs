// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_workflow;
use crate::dag::Workflow;
use crate::engine::{Scheduler, SchedulerOptions};

pub use crate::dag::{Task, list_tasks};
pub use crate::engine::{RunResult, TaskOutcome};
pub use crate::errors::{CyclicalReferenceError, RunflowError};
pub use crate::types::{TaskName, TaskStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - workflow file loading and validation
/// - optional target selection (`runflow build test`)
/// - the scheduler
/// - Ctrl-C → run cancellation
pub async fn run(args: CliArgs) -> Result<()> {
    let loaded = load_workflow(&args.config)?;

    let workflow = if args.tasks.is_empty() {
        loaded.workflow
    } else {
        loaded.workflow.select(&args.tasks)?
    };

    if args.dry_run {
        print_dry_run(&workflow);
        return Ok(());
    }

    let mut options = loaded.options;
    if let Some(max) = args.max_parallel {
        options = SchedulerOptions {
            max_parallel: std::num::NonZeroUsize::new(max),
        };
    }
    let scheduler = Scheduler::new(options);

    // Ctrl-C → cancel the run; running tasks are asked to stop.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            cancel.cancel();
        });
    }

    let result = scheduler.run(&workflow, cancel).await?;

    println!("runflow summary:");
    print!("{result}");

    result.into_result()?;
    Ok(())
}

/// Dry-run output: tasks in registration order with their dependencies.
fn print_dry_run(workflow: &Workflow) {
    println!("runflow dry-run");
    println!();
    println!("tasks ({}):", workflow.len());
    for task in workflow.list() {
        println!("  - {}", task.id());
        if !task.dependencies().is_empty() {
            println!("      depends_on: {:?}", task.dependencies());
        }
    }

    debug!("dry-run complete (no execution)");
}
