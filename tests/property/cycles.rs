// tests/property/cycles.rs

use std::collections::BTreeSet;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use proptest::prelude::*;

use runflow::errors::RunflowError;

use super::{name, workflow_from_indices};

/// Arbitrary directed graphs: `n` nodes, each with up to four edges to any
/// node (itself included).
fn any_graph_strategy(max_nodes: usize) -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(0..n, 0..4), n)
            .prop_map(move |deps| (n, deps))
    })
}

/// Acyclic graphs: task `i` may only depend on tasks `0..i`.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n).prop_map(
            move |raw| {
                let deps = raw
                    .into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            Vec::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect();
                (n, deps)
            },
        )
    })
}

/// Every node on a cycle according to petgraph: members of a strongly
/// connected component with more than one node, plus self-loops.
fn oracle_cycle_members(n: usize, deps: &[Vec<usize>]) -> BTreeSet<String> {
    let mut graph = DiGraph::<(), ()>::new();
    let nodes: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();
    for (i, targets) in deps.iter().enumerate() {
        for &d in targets {
            graph.update_edge(nodes[i], nodes[d], ());
        }
    }

    let mut members = BTreeSet::new();
    for component in tarjan_scc(&graph) {
        let self_loop = component.len() == 1 && graph.contains_edge(component[0], component[0]);
        if component.len() > 1 || self_loop {
            members.extend(component.iter().map(|node| name(node.index())));
        }
    }
    members
}

proptest! {
    #[test]
    fn reported_cycle_members_match_strongly_connected_components(
        (n, deps) in any_graph_strategy(12)
    ) {
        let wf = workflow_from_indices(n, &deps);
        let expected = oracle_cycle_members(n, &deps);

        match wf.validate() {
            Ok(()) => prop_assert!(expected.is_empty(), "missed cycle members {:?}", expected),
            Err(RunflowError::CyclicalReference(err)) => {
                let reported: BTreeSet<String> = err.tasks.iter().cloned().collect();
                prop_assert_eq!(reported.len(), err.tasks.len(), "duplicates in report");
                prop_assert_eq!(reported, expected);

                // Report is in registration order.
                let positions: Vec<usize> = err
                    .tasks
                    .iter()
                    .map(|t| wf.list().iter().position(|task| task.id() == t).unwrap())
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn validation_is_idempotent((n, deps) in any_graph_strategy(10)) {
        let wf = workflow_from_indices(n, &deps);
        let first = wf.validate().map_err(|e| e.to_string());
        let second = wf.validate().map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn acyclic_graphs_always_validate((n, deps) in dag_strategy(15)) {
        let wf = workflow_from_indices(n, &deps);
        prop_assert!(wf.validate().is_ok());
    }
}
