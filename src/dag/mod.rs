// src/dag/mod.rs

//! Dependency graph model.
//!
//! - [`task`] defines the immutable [`Task`] record.
//! - [`workflow`] owns the ordered task collection and validation.
//! - [`graph`] holds the index-based adjacency bookkeeping.
//! - [`cycle`] finds every task that participates in a cycle.

pub mod cycle;
pub mod graph;
pub mod task;
pub mod workflow;

pub use cycle::{check_acyclic, detect_cycles};
pub use graph::GraphIndex;
pub use task::Task;
pub use workflow::{Workflow, list_tasks};
