// tests/property/main.rs

//! Property-based tests, gathered into one test binary.

mod cycles;
mod scheduler;

use runflow::dag::Workflow;
use runflow_test_utils::builders::WorkflowBuilder;

/// Name of the task at `index` in generated workflows.
fn name(index: usize) -> String {
    format!("task_{index}")
}

/// Workflow of `n` always-succeeding tasks where `deps[i]` lists the
/// indices task `i` depends on.
fn workflow_from_indices(n: usize, deps: &[Vec<usize>]) -> Workflow {
    (0..n)
        .fold(WorkflowBuilder::new(), |builder, i| {
            let dep_names: Vec<String> = deps[i].iter().map(|&d| name(d)).collect();
            let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
            builder.task(&name(i), &dep_refs)
        })
        .build()
}
