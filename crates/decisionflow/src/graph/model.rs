//! Workflow graph model
//!
//! Stores nodes (in insertion order, indexed by id) and edges (in insertion
//! order). Every mutating operation returns a new `Graph` and leaves the
//! receiver untouched, so a caller holding an older snapshot keeps seeing a
//! consistent view.

use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use super::validator::classify;
use crate::core::{Edge, FlowError, Handle, Node, Position};

/// Canonical node and edge collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// Nodes in insertion order
    nodes: Vec<Node>,
    /// Node id -> index into `nodes`
    index: HashMap<String, usize>,
    /// Edges in insertion order
    edges: Vec<Edge>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from raw collections, checking every invariant
    ///
    /// Derived fields (control labels, decision borders) are recomputed, so
    /// stale or missing values in the input never survive.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, FlowError> {
        let mut graph = Self::new();
        for mut node in nodes {
            node.refresh_derived();
            if graph.index.contains_key(&node.id) {
                return Err(FlowError::DuplicateNodeId { id: node.id });
            }
            graph.index.insert(node.id.clone(), graph.nodes.len());
            graph.nodes.push(node);
        }
        graph.edges = edges;
        graph.check_invariants()?;
        debug!(
            node_count = graph.node_count(),
            edge_count = graph.edge_count(),
            "Graph assembled"
        );
        Ok(graph)
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving a node
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Edges entering a node
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// The edge currently filling the `(source, handle)` outgoing slot
    pub fn slot_occupant(&self, source: &str, handle: Option<&str>) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.source_handle.as_deref() == handle)
    }

    /// Copy with `node` appended
    pub fn with_node(&self, node: Node) -> Result<Self, FlowError> {
        if self.has_node(&node.id) {
            return Err(FlowError::DuplicateNodeId { id: node.id });
        }
        trace!(node_id = %node.id, node_kind = %node.kind(), "Adding node to graph");
        let mut next = self.clone();
        next.index.insert(node.id.clone(), next.nodes.len());
        next.nodes.push(node);
        debug!(node_count = next.node_count(), "Node added");
        Ok(next)
    }

    /// Copy with the node of the same id swapped for `node`
    ///
    /// Returns an unchanged copy if no node has that id.
    pub fn replacing_node(&self, node: Node) -> Self {
        let mut next = self.clone();
        match next.index.get(&node.id).copied() {
            Some(i) => {
                trace!(node_id = %node.id, "Replacing node");
                next.nodes[i] = node;
            }
            None => trace!(node_id = %node.id, "Replace skipped, node not found"),
        }
        next
    }

    /// Copy without the node and every edge touching it
    pub fn without_node(&self, id: &str) -> Self {
        if !self.has_node(id) {
            return self.clone();
        }
        let nodes: Vec<Node> = self.nodes.iter().filter(|n| n.id != id).cloned().collect();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| e.source != id && e.target != id)
            .cloned()
            .collect();
        debug!(
            node_id = %id,
            removed_edges = self.edges.len() - edges.len(),
            "Node removed"
        );
        Self { nodes, index, edges }
    }

    /// Copy without the edge of the given id
    pub fn without_edge(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.edges.retain(|e| e.id != id);
        trace!(edge_id = %id, removed = next.edges.len() < self.edges.len(), "Edge removal");
        next
    }

    /// Copy with a fully formed `edge` appended
    ///
    /// Refuses an id already in use; the result must still satisfy every
    /// graph invariant.
    pub fn with_edge(&self, edge: Edge) -> Result<Self, FlowError> {
        if self.get_edge(&edge.id).is_some() {
            return Err(FlowError::invariant_violation(format!(
                "edge id '{}' already exists",
                edge.id
            )));
        }
        let next = self.with_edge_unchecked(edge);
        next.check_invariants()?;
        Ok(next)
    }

    /// Copy with `edge` appended, without validation
    pub(crate) fn with_edge_unchecked(&self, edge: Edge) -> Self {
        trace!(
            edge_id = %edge.id,
            edge_source = %edge.source,
            edge_target = %edge.target,
            edge_handle = ?edge.source_handle,
            "Adding edge to graph"
        );
        let mut next = self.clone();
        next.edges.push(edge);
        debug!(edge_count = next.edge_count(), "Edge added");
        next
    }

    /// Copy with node positions overwritten from `positions`
    ///
    /// Nodes missing from the map keep their current position.
    pub fn with_positions(&self, positions: &HashMap<String, Position>) -> Self {
        let mut next = self.clone();
        for node in &mut next.nodes {
            if let Some(&position) = positions.get(&node.id) {
                node.position = position;
            }
        }
        next
    }

    /// Verify the six graph invariants, reporting the first violation
    pub fn check_invariants(&self) -> Result<(), FlowError> {
        if self.index.len() != self.nodes.len() {
            return Err(FlowError::invariant_violation("node ids are not unique"));
        }

        let mut edge_ids = HashSet::new();
        let mut slots = HashSet::new();
        let mut fed_targets = HashSet::new();

        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(FlowError::invariant_violation(format!(
                    "edge id '{}' is not unique",
                    edge.id
                )));
            }
            if edge.source == edge.target {
                return Err(FlowError::invariant_violation(format!(
                    "edge '{}' is a self-loop",
                    edge.id
                )));
            }
            let (Some(source), Some(target)) = (self.get_node(&edge.source), self.get_node(&edge.target))
            else {
                return Err(FlowError::invariant_violation(format!(
                    "edge '{}' references a missing node",
                    edge.id
                )));
            };

            // Non-branching nodes have a single outgoing slot regardless of handle
            let slot_handle = if source.kind().is_branching() {
                match edge.handle() {
                    Some(handle) => Some(handle),
                    None => {
                        return Err(FlowError::invariant_violation(format!(
                            "edge '{}' leaves control node '{}' without a yes/no handle",
                            edge.id, source.id
                        )))
                    }
                }
            } else {
                None::<Handle>
            };
            if !slots.insert((edge.source.as_str(), slot_handle)) {
                return Err(FlowError::invariant_violation(format!(
                    "outgoing slot of '{}' used more than once",
                    edge.source
                )));
            }
            if !fed_targets.insert(edge.target.as_str()) {
                return Err(FlowError::invariant_violation(format!(
                    "node '{}' has more than one incoming edge",
                    edge.target
                )));
            }
            if classify(source.kind(), target.kind()).is_none() {
                return Err(FlowError::invariant_violation(format!(
                    "edge '{}' connects {} to {}",
                    edge.id,
                    source.kind(),
                    target.kind()
                )));
            }
        }

        Ok(())
    }
}
