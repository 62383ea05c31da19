//! Graph snapshots
//!
//! A snapshot is the plain, serializable payload a save action receives:
//! every node and every edge at one instant.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::Graph;
use crate::core::{Edge, FlowError, Node};

/// Complete node and edge collections of a graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a snapshot from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = content.len(), "Read snapshot file");
        Self::from_json(&content)
    }
}

impl Graph {
    /// Capture the current nodes and edges
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().to_vec(),
            edges: self.edges().to_vec(),
        }
    }

    /// Restore a graph, refusing snapshots that break an invariant
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self, FlowError> {
        Graph::from_parts(snapshot.nodes, snapshot.edges)
    }
}
