//! Core layout trait for graph positioning
//!
//! This trait defines the interface for arranging workflow nodes in a
//! coordinate system, inspired by Dagre's layered layout.

use super::{Edge, FlowError, LayoutDirection, Node};

/// Core trait for layout algorithms
///
/// A layout algorithm is a pure function of its inputs: it reads a node and
/// edge snapshot and returns freshly positioned copies, holding no state
/// between calls.
///
/// # Example
/// ```
/// use decisionflow::core::{LayoutAlgorithm, LayoutDirection};
/// use decisionflow::layout::LayoutEngine;
/// use decisionflow::seed_graph;
///
/// let graph = seed_graph();
/// let engine = LayoutEngine::new();
/// let result = engine
///     .layout(graph.nodes(), graph.edges(), LayoutDirection::TopToBottom)
///     .unwrap();
/// assert_eq!(result.nodes.len(), 4);
/// ```
pub trait LayoutAlgorithm: Send + Sync {
    /// The output type of this layout algorithm
    type Output;

    /// Arrange the given nodes along `direction`
    fn layout(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        direction: LayoutDirection,
    ) -> Result<Self::Output, FlowError>;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the version of this layout algorithm
    fn version(&self) -> &'static str;
}
