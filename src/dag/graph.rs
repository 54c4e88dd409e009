// src/dag/graph.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{EntityKind, Result, TaskGraphError};
use crate::types::{new_id, EdgeId, TaskId};

/// Internal node structure: stores the ids of incident edges.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Edges whose target is this node (this node depends on their source).
    incoming: Vec<EdgeId>,
    /// Edges whose source is this node (their target depends on this node).
    outgoing: Vec<EdgeId>,
}

/// A single "depends-on" edge: `target` requires `source` to be done first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagEdge {
    pub source: TaskId,
    pub target: TaskId,
}

/// In-memory DAG keyed by task id, with identified edges.
///
/// Acyclicity is assumed by the callers; only self-loops are refused here.
/// Parallel edges between the same ordered pair are collapsed into one.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: HashMap<TaskId, DagNode>,
    edges: HashMap<EdgeId, DagEdge>,
}

impl DagGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, id: &str) {
        self.nodes.entry(id.to_string()).or_default();
    }

    /// Remove a node and every edge touching it. Returns `false` if the node
    /// was not present.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };

        for edge_id in node.incoming.iter().chain(node.outgoing.iter()) {
            if let Some(edge) = self.edges.remove(edge_id) {
                if let Some(src) = self.nodes.get_mut(&edge.source) {
                    src.outgoing.retain(|e| e != edge_id);
                }
                if let Some(dst) = self.nodes.get_mut(&edge.target) {
                    dst.incoming.retain(|e| e != edge_id);
                }
            }
        }
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All node ids, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// All edges with their ids, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeId, &DagEdge)> {
        self.edges.iter()
    }

    /// Add an edge `source -> target` (target depends on source) and return
    /// its id. Both endpoints must exist.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<EdgeId> {
        self.add_edge_with_id(new_id(), source, target)
    }

    fn add_edge_with_id(&mut self, id: EdgeId, source: &str, target: &str) -> Result<EdgeId> {
        if source == target {
            return Err(TaskGraphError::InvalidState(format!(
                "task '{source}' cannot depend on itself"
            )));
        }
        for endpoint in [source, target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(TaskGraphError::not_found(EntityKind::Task, endpoint));
            }
        }
        if let Some(existing) = self.find_edge(source, target) {
            return Ok(existing);
        }

        self.edges.insert(
            id.clone(),
            DagEdge {
                source: source.to_string(),
                target: target.to_string(),
            },
        );
        if let Some(node) = self.nodes.get_mut(source) {
            node.outgoing.push(id.clone());
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.incoming.push(id.clone());
        }
        Ok(id)
    }

    /// Remove an edge by id and return it.
    pub fn remove_edge(&mut self, edge_id: &str) -> Result<DagEdge> {
        let edge = self
            .edges
            .remove(edge_id)
            .ok_or_else(|| TaskGraphError::not_found(EntityKind::Dependency, edge_id))?;

        if let Some(src) = self.nodes.get_mut(&edge.source) {
            src.outgoing.retain(|e| e != edge_id);
        }
        if let Some(dst) = self.nodes.get_mut(&edge.target) {
            dst.incoming.retain(|e| e != edge_id);
        }
        Ok(edge)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&DagEdge> {
        self.edges.get(edge_id)
    }

    /// Id of the edge `source -> target`, if present.
    pub fn find_edge(&self, source: &str, target: &str) -> Option<EdgeId> {
        let node = self.nodes.get(source)?;
        node.outgoing
            .iter()
            .find(|id| {
                self.edges
                    .get(id.as_str())
                    .is_some_and(|e| e.target == target)
            })
            .cloned()
    }

    /// Direct predecessors of a task: the tasks it depends on.
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.nodes
            .get(id)
            .map(|n| n.incoming.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|e| self.edges.get(e))
            .map(|e| e.source.as_str())
            .collect()
    }

    /// Direct successors of a task: the tasks that depend on it.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.nodes
            .get(id)
            .map(|n| n.outgoing.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|e| self.edges.get(e))
            .map(|e| e.target.as_str())
            .collect()
    }

    /// Canonical node-link representation: nodes and links sorted so that
    /// identical graphs always serialize to identical bytes.
    pub fn to_node_link(&self) -> NodeLinkData {
        let mut nodes: Vec<NodeLinkNode> = self
            .nodes
            .keys()
            .map(|id| NodeLinkNode { id: id.clone() })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut links: Vec<NodeLinkLink> = self
            .edges
            .iter()
            .map(|(id, e)| NodeLinkLink {
                source: e.source.clone(),
                target: e.target.clone(),
                key: Some(id.clone()),
            })
            .collect();
        links.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        NodeLinkData {
            directed: true,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes,
            links,
        }
    }

    /// Rebuild a graph from its node-link representation.
    ///
    /// Links referencing unknown nodes add those nodes implicitly. Links
    /// without a `key` get a freshly generated edge id.
    pub fn from_node_link(data: &NodeLinkData) -> Result<Self> {
        let mut graph = DagGraph::new();
        for node in &data.nodes {
            graph.add_node(&node.id);
        }
        for link in &data.links {
            graph.add_node(&link.source);
            graph.add_node(&link.target);
            let id = link.key.clone().unwrap_or_else(new_id);
            graph.add_edge_with_id(id, &link.source, &link.target)?;
        }
        Ok(graph)
    }
}

/// Node-link graph document (`{directed, multigraph, graph, nodes, links}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkData {
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default)]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub nodes: Vec<NodeLinkNode>,
    #[serde(default, alias = "edges")]
    pub links: Vec<NodeLinkLink>,
}

fn default_directed() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkNode {
    pub id: TaskId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkLink {
    pub source: TaskId,
    pub target: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<EdgeId>,
}
