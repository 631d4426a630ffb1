// tests/property/scheduler.rs

use std::collections::BTreeSet;

use proptest::prelude::*;

use runflow::engine::RunState;
use runflow::types::TaskStatus;

use super::workflow_from_indices;

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..n), n).prop_map(
            move |raw| {
                let deps = raw
                    .into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        let unique: BTreeSet<usize> =
                            picks.into_iter().filter(|_| i > 0).map(|p| p % i.max(1)).collect();
                        unique.into_iter().collect()
                    })
                    .collect();
                (n, deps)
            },
        )
    })
}

proptest! {
    /// Drive the run state with an arbitrary completion order and failure
    /// set, checking the ordering and propagation rules at every step.
    #[test]
    fn run_state_respects_dependencies_and_terminates(
        (n, deps) in dag_strategy(10),
        failing in proptest::collection::btree_set(0..10usize, 0..4),
        picks in proptest::collection::vec(any::<usize>(), 1..64),
        limit in proptest::option::of(1..4usize),
    ) {
        let wf = workflow_from_indices(n, &deps);
        let graph = wf.validated_graph().unwrap();
        let mut state = RunState::new(&graph);

        let mut running: Vec<usize> = Vec::new();
        let mut ever_started = BTreeSet::new();
        let mut step = 0usize;

        loop {
            for index in state.dispatch(limit) {
                // Never started before every dependency succeeded.
                for &dep in &deps[index] {
                    prop_assert_eq!(state.status(dep), TaskStatus::Succeeded);
                }
                prop_assert!(ever_started.insert(index), "task {} started twice", index);
                running.push(index);
            }

            if let Some(max) = limit {
                prop_assert!(running.len() <= max);
            }

            if running.is_empty() {
                break;
            }

            let pick = picks[step % picks.len()] % running.len();
            step += 1;
            let index = running.swap_remove(pick);
            state.complete(index, !failing.contains(&index));
        }

        prop_assert!(state.is_finished());
        prop_assert_eq!(state.running_count(), 0);

        for i in 0..n {
            let status = state.status(i);
            match status {
                TaskStatus::Succeeded => prop_assert!(!failing.contains(&i)),
                TaskStatus::Failed => prop_assert!(failing.contains(&i)),
                TaskStatus::Skipped => {
                    let causes = state.skip_causes(i);
                    prop_assert!(!causes.is_empty());
                    let ancestors = graph.transitive_dependencies(i);
                    for cause in causes {
                        prop_assert_eq!(state.status(*cause), TaskStatus::Failed);
                        prop_assert!(ancestors.contains(cause));
                    }
                }
                other => prop_assert!(false, "task {} ended as {}", i, other),
            }

            // A task runs exactly when all its dependencies succeeded.
            let deps_ok = deps[i].iter().all(|&d| state.status(d) == TaskStatus::Succeeded);
            prop_assert_eq!(ever_started.contains(&i), deps_ok);
        }
    }
}
