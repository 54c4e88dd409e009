// src/dag/mod.rs

//! Project DAGs and status resolution.
//!
//! - [`graph`] holds the directed graph of tasks with identified edges.
//! - [`metadata`] defines per-task metadata and issues.
//! - [`resolver`] decides a task's status from its predecessors.
//! - [`project`] ties graph, metadata and resolution into one project.
//! - [`taskgraph`] is the set of projects.

pub mod graph;
pub mod metadata;
pub mod project;
pub mod resolver;
pub mod taskgraph;

pub use graph::{DagEdge, DagGraph, NodeLinkData};
pub use metadata::{Issue, IssuePatch, TaskMetadata, TaskPatch};
pub use project::{ProjectData, ProjectStatistics, TaskGraphProject, ROOT_TASK_NAME};
pub use resolver::{resolve_status, Resolution};
pub use taskgraph::{ProjectSummary, TaskGraph};
