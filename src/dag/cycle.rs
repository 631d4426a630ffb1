// src/dag/cycle.rs

//! Cycle detection over a [`GraphIndex`].
//!
//! The traversal is an iterative depth-first search in registration order
//! with three node colours:
//!
//! - `Unvisited`: not reached yet,
//! - `InProgress`: reached, and still on the component stack,
//! - `Done`: assigned to a finished strongly connected component.
//!
//! A back edge into an `InProgress` node only proves that the stack slice
//! between the two nodes is cyclic. A node can also sit on a cycle while its
//! only path back runs through a node the traversal has already left (for
//! `A→B, B→A, A→C, C→B`, `C` never sees `A` on its own path). Tracking a
//! low-link per node catches those members too, so the result is the full
//! set of nodes that lie on any cycle, across every independent cycle.

use tracing::debug;

use crate::dag::graph::GraphIndex;
use crate::errors::CyclicalReferenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// One suspended DFS level: the node and the next dependency edge to try.
#[derive(Debug)]
struct Frame {
    node: usize,
    next_edge: usize,
}

struct Traversal<'g> {
    graph: &'g GraphIndex,
    color: Vec<Color>,
    /// Discovery order of each node.
    order: Vec<usize>,
    /// Smallest discovery order reachable while the node is in progress.
    low: Vec<usize>,
    counter: usize,
    /// Nodes coloured `InProgress`, in discovery order.
    component: Vec<usize>,
    on_cycle: Vec<bool>,
}

impl<'g> Traversal<'g> {
    fn new(graph: &'g GraphIndex) -> Self {
        let n = graph.len();
        Self {
            graph,
            color: vec![Color::Unvisited; n],
            order: vec![0; n],
            low: vec![0; n],
            counter: 0,
            component: Vec::new(),
            on_cycle: vec![false; n],
        }
    }

    fn enter(&mut self, node: usize) {
        self.color[node] = Color::InProgress;
        self.order[node] = self.counter;
        self.low[node] = self.counter;
        self.counter += 1;
        self.component.push(node);
    }

    fn run(mut self) -> Vec<usize> {
        let mut frames: Vec<Frame> = Vec::new();

        for root in 0..self.graph.len() {
            if self.color[root] != Color::Unvisited {
                continue;
            }

            self.enter(root);
            frames.push(Frame {
                node: root,
                next_edge: 0,
            });

            while let Some(frame) = frames.last_mut() {
                let node = frame.node;

                if let Some(&dep) = self.graph.dependency_indices(node).get(frame.next_edge) {
                    frame.next_edge += 1;
                    match self.color[dep] {
                        Color::Unvisited => {
                            self.enter(dep);
                            frames.push(Frame {
                                node: dep,
                                next_edge: 0,
                            });
                        }
                        Color::InProgress => {
                            self.low[node] = self.low[node].min(self.order[dep]);
                        }
                        Color::Done => {}
                    }
                    continue;
                }

                frames.pop();
                if let Some(parent) = frames.last() {
                    self.low[parent.node] = self.low[parent.node].min(self.low[node]);
                }

                if self.low[node] == self.order[node] {
                    self.close_component(node);
                }
            }
        }

        self.on_cycle
            .iter()
            .enumerate()
            .filter_map(|(i, &cyclic)| cyclic.then_some(i))
            .collect()
    }

    /// Pop the component rooted at `root` and mark it `Done`.
    fn close_component(&mut self, root: usize) {
        let mut members = Vec::new();
        while let Some(member) = self.component.pop() {
            self.color[member] = Color::Done;
            members.push(member);
            if member == root {
                break;
            }
        }

        let self_loop = self.graph.dependency_indices(root).contains(&root);
        if members.len() > 1 || self_loop {
            debug!(
                tasks = ?members.iter().map(|&m| self.graph.id(m)).collect::<Vec<_>>(),
                "found dependency cycle"
            );
            for member in members {
                self.on_cycle[member] = true;
            }
        }
    }
}

/// Indices (registration order) of every task that lies on a cycle.
///
/// Empty when the graph is acyclic.
pub fn detect_cycles(graph: &GraphIndex) -> Vec<usize> {
    Traversal::new(graph).run()
}

/// `Ok(())` for a DAG, otherwise the complete list of cyclic task ids.
pub fn check_acyclic(graph: &GraphIndex) -> Result<(), CyclicalReferenceError> {
    let cyclic = detect_cycles(graph);
    if cyclic.is_empty() {
        return Ok(());
    }

    Err(CyclicalReferenceError {
        tasks: cyclic
            .into_iter()
            .map(|i| graph.id(i).to_string())
            .collect(),
    })
}
