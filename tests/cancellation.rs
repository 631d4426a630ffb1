// tests/cancellation.rs

use std::error::Error;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use runflow::engine::{RunResult, Scheduler};
use runflow::errors::RunflowError;
use runflow::types::TaskStatus;
use runflow_test_utils::builders::WorkflowBuilder;
use runflow_test_utils::fake_action::{ExecutionLog, ScriptedAction};
use runflow_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

async fn wait_until_started(log: &ExecutionLog, tasks: &[&str]) {
    with_timeout(async {
        while !tasks.iter().all(|t| log.was_started(t)) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

fn spawn_run(
    wf: runflow::dag::Workflow,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<runflow::errors::Result<RunResult>> {
    tokio::spawn(async move { Scheduler::default().run(&wf, cancel).await })
}

#[tokio::test]
async fn cancel_marks_unstarted_tasks_cancelled_and_running_ones_failed() -> TestResult {
    init_tracing();

    let builder = WorkflowBuilder::new();
    let log = builder.log();
    let wf = builder
        .with_action("A", &[], ScriptedAction::wait_for_cancel(&log))
        .task("B", &["A"])
        .with_action("C", &[], ScriptedAction::wait_for_cancel(&log))
        .task("D", &["B", "C"])
        .build();

    let cancel = CancellationToken::new();
    let run = spawn_run(wf, cancel.clone());

    wait_until_started(&log, &["A", "C"]).await;
    cancel.cancel();

    let result = with_timeout(run).await??;

    assert_eq!(result.status_of("A"), Some(TaskStatus::Failed));
    assert_eq!(result.status_of("C"), Some(TaskStatus::Failed));
    assert_eq!(result.cancelled(), vec!["B", "D"]);
    assert!(result.skipped().is_empty());
    assert!(!log.was_started("B"));
    assert!(!result.is_success());
    Ok(())
}

#[tokio::test]
async fn already_cancelled_token_runs_nothing() -> TestResult {
    init_tracing();

    let (wf, log) = WorkflowBuilder::new()
        .task("A", &[])
        .task("B", &["A"])
        .task("C", &[])
        .build_with_log();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = with_timeout(Scheduler::default().run(&wf, cancel)).await?;

    assert_eq!(result.cancelled(), vec!["A", "B", "C"]);
    assert!(log.started().is_empty());
    assert!(result.reports().iter().all(|r| r.elapsed.is_none()));
    Ok(())
}

#[tokio::test]
async fn action_that_ignores_cancellation_still_fails() -> TestResult {
    init_tracing();

    let builder = WorkflowBuilder::new();
    let log = builder.log();
    let wf = builder
        .with_action("A", &[], ScriptedAction::ignore_cancel(&log))
        .task("B", &["A"])
        .build();

    let cancel = CancellationToken::new();
    let run = spawn_run(wf, cancel.clone());

    wait_until_started(&log, &["A"]).await;
    cancel.cancel();

    let result = with_timeout(run).await??;

    // A returned Ok, but only after its context was cancelled.
    assert_eq!(result.status_of("A"), Some(TaskStatus::Failed));
    assert_eq!(result.status_of("B"), Some(TaskStatus::Cancelled));
    assert!(result.output_of("A").is_none());

    let (_, err) = result.failed()[0];
    assert!(err.to_string().contains("cancelled while running"), "{err}");
    Ok(())
}

#[tokio::test]
async fn run_cancelled_while_every_task_runs_is_not_a_success() -> TestResult {
    init_tracing();

    let builder = WorkflowBuilder::new();
    let log = builder.log();
    let wf = builder
        .with_action("A", &[], ScriptedAction::ignore_cancel(&log))
        .with_action("B", &[], ScriptedAction::ignore_cancel(&log))
        .build();

    let cancel = CancellationToken::new();
    let run = spawn_run(wf, cancel.clone());

    wait_until_started(&log, &["A", "B"]).await;
    cancel.cancel();

    let result = with_timeout(run).await??;

    // Both actions completed Ok once they saw the signal.
    assert_eq!(log.finished().len(), 2);
    assert!(result.succeeded().is_empty());
    assert_eq!(result.failed().len(), 2);
    assert!(result.cancelled().is_empty());
    assert!(!result.is_success());

    match result.into_result() {
        Err(RunflowError::RunFailed {
            failed,
            skipped,
            cancelled,
        }) => assert_eq!((failed, skipped, cancelled), (2, 0, 0)),
        other => panic!("expected RunFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn tasks_finished_before_the_cancel_keep_their_outcome() -> TestResult {
    init_tracing();

    let builder = WorkflowBuilder::new();
    let log = builder.log();
    let wf = builder
        .task("A", &[])
        .with_action("B", &["A"], ScriptedAction::wait_for_cancel(&log))
        .task("C", &["B"])
        .build();

    let cancel = CancellationToken::new();
    let run = spawn_run(wf, cancel.clone());

    wait_until_started(&log, &["B"]).await;
    cancel.cancel();

    let result = with_timeout(run).await??;

    assert_eq!(result.status_of("A"), Some(TaskStatus::Succeeded));
    assert_eq!(result.status_of("B"), Some(TaskStatus::Failed));
    assert_eq!(result.status_of("C"), Some(TaskStatus::Cancelled));
    Ok(())
}

#[tokio::test]
async fn cancelling_a_sleeping_action_ends_the_run_early() -> TestResult {
    init_tracing();

    let builder = WorkflowBuilder::new();
    let log = builder.log();
    let wf = builder
        .with_action("long", &[], ScriptedAction::sleep(&log, Duration::from_secs(60)))
        .build();

    let cancel = CancellationToken::new();
    let run = spawn_run(wf, cancel.clone());

    wait_until_started(&log, &["long"]).await;
    cancel.cancel();

    // with_timeout fails the test if the sleep were not interrupted.
    let result = with_timeout(run).await??;
    assert_eq!(result.status_of("long"), Some(TaskStatus::Failed));
    Ok(())
}
