//! Coordinate assignment
//!
//! Layers are stacked along the main axis (y for top-to-bottom, x for
//! left-to-right) and each layer is centred on a shared cross-axis line.

use tracing::debug;

use super::LayoutConfig;
use crate::core::{LayoutDirection, Position, Size};

/// Extent of a size along the stacking axis and across it
fn extents(size: Size, direction: LayoutDirection) -> (f64, f64) {
    if direction.is_vertical() {
        (size.height, size.width)
    } else {
        (size.width, size.height)
    }
}

/// Top-left positions for every node plus the overall canvas extent
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Indexed like the input nodes
    pub positions: Vec<Position>,
    pub width: f64,
    pub height: f64,
}

/// Place ordered layers without overlap
///
/// Nodes in the same layer are `node_sep` apart and consecutive layers are
/// `rank_sep` apart. A node thinner than its layer is centred within it.
pub fn assign_positions(
    layers: &[Vec<usize>],
    sizes: &[Size],
    direction: LayoutDirection,
    config: &LayoutConfig,
) -> Placement {
    let mut positions = vec![Position::default(); sizes.len()];
    if layers.is_empty() {
        return Placement {
            positions,
            width: 0.0,
            height: 0.0,
        };
    }

    let breadth_of = |layer: &[usize]| -> f64 {
        let total: f64 = layer.iter().map(|&n| extents(sizes[n], direction).1).sum();
        total + layer.len().saturating_sub(1) as f64 * config.node_sep
    };
    let widest = layers.iter().map(|l| breadth_of(l)).fold(0.0, f64::max);

    let mut main = config.padding;
    for layer in layers {
        let thickness = layer
            .iter()
            .map(|&n| extents(sizes[n], direction).0)
            .fold(0.0, f64::max);
        let mut cross = config.padding + (widest - breadth_of(layer)) / 2.0;

        for &node in layer {
            let (node_main, node_cross) = extents(sizes[node], direction);
            let offset = main + (thickness - node_main) / 2.0;
            positions[node] = if direction.is_vertical() {
                Position::new(cross, offset)
            } else {
                Position::new(offset, cross)
            };
            cross += node_cross + config.node_sep;
        }

        main += thickness + config.rank_sep;
    }

    let main_extent = main - config.rank_sep + config.padding;
    let cross_extent = widest + 2.0 * config.padding;
    let (width, height) = if direction.is_vertical() {
        (cross_extent, main_extent)
    } else {
        (main_extent, cross_extent)
    };

    debug!(width, height, layer_count = layers.len(), "Node positioning completed");
    Placement {
        positions,
        width,
        height,
    }
}
