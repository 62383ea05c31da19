//! Layer assignment
//!
//! Longest-path ranking over the per-call adjacency arena: sources get rank
//! 0 and every other node sits one rank below its deepest predecessor.

use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

use crate::core::{Edge, FlowError, Handle, Node};

/// Adjacency built fresh for one layout call
///
/// Nodes are addressed by their index in the input slice, so insertion
/// order doubles as the tie-break everywhere downstream.
#[derive(Debug)]
pub struct LayoutGraph<'a> {
    pub ids: Vec<&'a str>,
    /// Per node: (predecessor index, port bias of the connecting edge)
    pub preds: Vec<Vec<(usize, f64)>>,
    /// Per node: (successor index, port bias of the connecting edge)
    pub succs: Vec<Vec<(usize, f64)>>,
    /// Per node: children reached through a yes/no handle
    pub branches: Vec<Vec<(usize, Handle)>>,
}

/// Horizontal nudge for children hanging off a branch handle
fn port_bias(edge: &Edge) -> f64 {
    match edge.handle() {
        Some(Handle::Yes) => -0.25,
        Some(Handle::No) => 0.25,
        None => 0.0,
    }
}

impl<'a> LayoutGraph<'a> {
    /// Index the snapshot, rejecting duplicate ids and dangling edges
    pub fn build(nodes: &'a [Node], edges: &'a [Edge]) -> Result<Self, FlowError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(FlowError::malformed_layout(format!(
                    "node id '{}' appears more than once",
                    node.id
                )));
            }
        }

        let mut preds = vec![Vec::new(); nodes.len()];
        let mut succs = vec![Vec::new(); nodes.len()];
        let mut branches = vec![Vec::new(); nodes.len()];
        for edge in edges {
            let (Some(&from), Some(&to)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            else {
                return Err(FlowError::malformed_layout(format!(
                    "edge '{}' references a node outside the input",
                    edge.id
                )));
            };
            let bias = port_bias(edge);
            succs[from].push((to, bias));
            preds[to].push((from, bias));
            if let Some(handle) = edge.handle() {
                branches[from].push((to, handle));
            }
        }

        Ok(Self {
            ids: nodes.iter().map(|n| n.id.as_str()).collect(),
            preds,
            succs,
            branches,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Successor indices of `node`
    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.succs[node].iter().map(|&(s, _)| s)
    }
}

/// Longest-path ranks, indexed like the input nodes
///
/// Uses Kahn's algorithm with a FIFO seeded in insertion order. A cycle
/// leaves nodes unprocessed and fails the whole call.
pub fn assign_ranks(graph: &LayoutGraph<'_>) -> Result<Vec<usize>, FlowError> {
    trace!(node_count = graph.len(), "Starting rank assignment");

    let mut in_degree: Vec<usize> = graph.preds.iter().map(|p| p.len()).collect();
    let mut ranks = vec![0usize; graph.len()];
    let mut queue: VecDeque<usize> = (0..graph.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut processed = 0;

    while let Some(node) = queue.pop_front() {
        processed += 1;
        for successor in graph.successors(node) {
            ranks[successor] = ranks[successor].max(ranks[node] + 1);
            in_degree[successor] -= 1;
            if in_degree[successor] == 0 {
                queue.push_back(successor);
            }
        }
    }

    if processed < graph.len() {
        let stuck: Vec<&str> = (0..graph.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| graph.ids[i])
            .collect();
        debug!(sorted_count = processed, total_nodes = graph.len(), "Cycle detected in graph");
        return Err(FlowError::malformed_layout(format!(
            "edges form a cycle through {}",
            stuck.join(", ")
        )));
    }

    debug!(max_rank = ranks.iter().max().copied().unwrap_or(0), "Ranks assigned");
    Ok(ranks)
}

/// Group node indices by rank, preserving insertion order inside a rank
pub fn group_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let Some(&max_rank) = ranks.iter().max() else {
        return Vec::new();
    };
    let mut layers = vec![Vec::new(); max_rank + 1];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }
    layers
}
