// crates/test-utils/src/lib.rs

//! Shared fixtures for the runflow integration tests.

pub mod builders;
pub mod fake_action;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use runflow::dag::Workflow;
use runflow::engine::{RunResult, Scheduler};

/// Upper bound for any single test run; a hung scheduler fails the test
/// instead of stalling the suite.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output only shows for failing tests unless `--nocapture` is given.
/// Levels follow `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it outlives [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}

/// Run `workflow` to completion on `scheduler` with a token nobody cancels.
pub async fn run_to_completion(
    scheduler: &Scheduler,
    workflow: &Workflow,
) -> runflow::errors::Result<RunResult> {
    with_timeout(scheduler.run(workflow, CancellationToken::new())).await
}
