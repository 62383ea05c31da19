//! Layered DAG layout
//!
//! Converts a node/edge snapshot into deterministic positions in three
//! phases: longest-path ranking ([`rank`]), barycenter crossing reduction
//! ([`ordering`]) and coordinate assignment ([`position`]). Every call builds
//! its own adjacency arena, so the engine holds nothing but configuration.

pub mod ordering;
pub mod position;
pub mod rank;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, span, trace, Level};
use unicode_width::UnicodeWidthStr;

use crate::core::{Edge, FlowError, LayoutAlgorithm, LayoutDirection, Node, Position, Size};
use crate::graph::Graph;

/// Spacing and sizing knobs for the layout engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between neighbouring nodes in the same rank
    pub node_sep: f64,
    /// Gap between consecutive ranks
    pub rank_sep: f64,
    pub default_width: f64,
    pub default_height: f64,
    /// Canvas units per column of label text
    pub char_width: f64,
    pub label_padding: f64,
    /// Margin around the whole drawing
    pub padding: f64,
    pub ordering_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_sep: 50.0,
            rank_sep: 80.0,
            default_width: 150.0,
            default_height: 40.0,
            char_width: 8.0,
            label_padding: 12.0,
            padding: 20.0,
            ordering_iterations: 4,
        }
    }
}

impl LayoutConfig {
    /// Reject negative or non-finite spacing and non-positive default sizes
    pub fn validate(&self) -> Result<(), FlowError> {
        let spacing = [
            ("node_sep", self.node_sep),
            ("rank_sep", self.rank_sep),
            ("char_width", self.char_width),
            ("label_padding", self.label_padding),
            ("padding", self.padding),
        ];
        for (name, value) in spacing {
            if !value.is_finite() || value < 0.0 {
                return Err(FlowError::config_error(format!(
                    "layout.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !Size::new(self.default_width, self.default_height).is_usable() {
            return Err(FlowError::config_error(
                "layout default node size must be positive",
            ));
        }
        Ok(())
    }
}

/// Positioned copy of a layout input
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    /// Input nodes, in input order, with new top-left positions
    pub nodes: Vec<Node>,
    /// Input edges, unchanged
    pub edges: Vec<Edge>,
    pub ranks: HashMap<String, usize>,
    /// Crossings left after ordering
    pub crossings: usize,
    pub width: f64,
    pub height: f64,
}

impl LayoutResult {
    pub fn rank(&self, node_id: &str) -> Option<usize> {
        self.ranks.get(node_id).copied()
    }

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

/// Layered layout engine
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Bounding box used for spacing
    ///
    /// An explicit, usable `size` wins. Otherwise the display label is
    /// measured in terminal columns and floored at the default size.
    pub fn measure(&self, node: &Node) -> Size {
        if let Some(size) = node.size.filter(Size::is_usable) {
            return size;
        }
        let label = node.display_label();
        let label_width = UnicodeWidthStr::width(label.as_str()) as f64 * self.config.char_width
            + 2.0 * self.config.label_padding;
        Size::new(
            label_width.max(self.config.default_width),
            self.config.default_height,
        )
    }

    /// Lay out a whole graph and return it with the new positions
    pub fn apply(&self, graph: &Graph, direction: LayoutDirection) -> Result<Graph, FlowError> {
        let result = self.layout(graph.nodes(), graph.edges(), direction)?;
        let positions: HashMap<String, _> = result
            .nodes
            .into_iter()
            .map(|node| (node.id, node.position))
            .collect();
        Ok(graph.with_positions(&positions))
    }
}

impl LayoutAlgorithm for LayoutEngine {
    type Output = LayoutResult;

    fn layout(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        direction: LayoutDirection,
    ) -> Result<Self::Output, FlowError> {
        let layout_span = span!(
            Level::INFO,
            "layout_graph",
            node_count = nodes.len(),
            edge_count = edges.len(),
            %direction
        );
        let _enter = layout_span.enter();

        trace!("Starting graph layout");

        let arena = rank::LayoutGraph::build(nodes, edges)?;

        let rank_span = span!(Level::DEBUG, "assign_ranks");
        let rank_enter = rank_span.enter();
        let ranks = rank::assign_ranks(&arena)?;
        let mut layers = rank::group_layers(&ranks);
        drop(rank_enter);

        let order_span = span!(Level::DEBUG, "order_layers", layer_count = layers.len());
        let order_enter = order_span.enter();
        let crossings =
            ordering::reduce_crossings(&arena, &mut layers, self.config.ordering_iterations);
        debug!(crossings, "Layer ordering completed");
        drop(order_enter);

        let position_span = span!(Level::DEBUG, "assign_positions", %direction);
        let position_enter = position_span.enter();
        let sizes: Vec<Size> = nodes.iter().map(|n| self.measure(n)).collect();
        let placement = position::assign_positions(&layers, &sizes, direction, &self.config);
        drop(position_enter);

        // Huge but finite node sizes can still sum past f64::MAX
        let finite = placement.width.is_finite()
            && placement.height.is_finite()
            && placement.positions.iter().all(Position::is_finite);
        if !finite {
            return Err(FlowError::malformed_layout(
                "node sizes overflow the drawing extent",
            ));
        }

        let positioned: Vec<Node> = nodes
            .iter()
            .zip(&placement.positions)
            .map(|(node, &position)| Node {
                position,
                ..node.clone()
            })
            .collect();

        info!(
            width = placement.width,
            height = placement.height,
            crossings,
            "Layout completed"
        );

        Ok(LayoutResult {
            ranks: nodes
                .iter()
                .zip(&ranks)
                .map(|(node, &r)| (node.id.clone(), r))
                .collect(),
            nodes: positioned,
            edges: edges.to_vec(),
            crossings,
            width: placement.width,
            height: placement.height,
        })
    }

    fn name(&self) -> &'static str {
        "layered"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}

/// Lay out with the default configuration
pub fn layout(
    nodes: &[Node],
    edges: &[Edge],
    direction: LayoutDirection,
) -> Result<LayoutResult, FlowError> {
    LayoutEngine::new().layout(nodes, edges, direction)
}
