//! Crossing reduction within ranks
//!
//! Each rank is reordered by the mean slot of its neighbours in the rank
//! above (downward pass) or below (upward pass). Branch edges shift that
//! mean by their port bias, which keeps a yes child left of its no sibling.

use std::cmp::Ordering;
use tracing::trace;

use super::rank::LayoutGraph;
use crate::core::Handle;

/// Which neighbouring rank a pass measures against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Against predecessors in the rank above
    Down,
    /// Against successors in the rank below
    Up,
}

/// Slot of each node within `layer`, indexed by node
fn slots(layer: &[usize], node_count: usize) -> Vec<Option<usize>> {
    let mut slot = vec![None; node_count];
    for (i, &node) in layer.iter().enumerate() {
        slot[node] = Some(i);
    }
    slot
}

/// Total crossings over every pair of adjacent ranks
pub fn count_crossings(layers: &[Vec<usize>], graph: &LayoutGraph<'_>) -> usize {
    layers
        .windows(2)
        .map(|pair| crossings_between(&pair[0], &pair[1], graph))
        .sum()
}

fn crossings_between(upper: &[usize], lower: &[usize], graph: &LayoutGraph<'_>) -> usize {
    let lower_slot = slots(lower, graph.len());
    let mut links: Vec<(usize, usize)> = Vec::new();
    for (u, &node) in upper.iter().enumerate() {
        links.extend(
            graph
                .successors(node)
                .filter_map(|succ| lower_slot[succ].map(|l| (u, l))),
        );
    }

    // Sorted by upper slot, two links cross exactly when their lower slots are inverted
    links.sort_unstable();
    links
        .iter()
        .enumerate()
        .map(|(i, &(_, a))| links[i + 1..].iter().filter(|&&(_, b)| b < a).count())
        .sum()
}

/// Count parents whose no child sits before their yes child
pub fn branch_inversions(layers: &[Vec<usize>], graph: &LayoutGraph<'_>) -> usize {
    let mut slot = vec![usize::MAX; graph.len()];
    for layer in layers {
        for (i, &node) in layer.iter().enumerate() {
            slot[node] = i;
        }
    }

    graph
        .branches
        .iter()
        .filter(|children| {
            let child = |wanted: Handle| {
                children
                    .iter()
                    .find(|&&(_, handle)| handle == wanted)
                    .map(|&(c, _)| c)
            };
            matches!((child(Handle::Yes), child(Handle::No)), (Some(yes), Some(no)) if slot[no] < slot[yes])
        })
        .count()
}

/// Mean biased slot of each node's neighbours in `reference`
///
/// `None` marks a node with no neighbour in that rank.
pub fn barycenters(
    layer: &[usize],
    reference: &[usize],
    graph: &LayoutGraph<'_>,
    sweep: Sweep,
) -> Vec<Option<f64>> {
    let slot = slots(reference, graph.len());

    layer
        .iter()
        .map(|&node| {
            // A bias nudges the child, so it flips sign when seen from the child
            let (links, sign) = match sweep {
                Sweep::Down => (&graph.preds[node], 1.0),
                Sweep::Up => (&graph.succs[node], -1.0),
            };
            let (sum, count) = links
                .iter()
                .filter_map(|&(n, bias)| slot[n].map(|s| s as f64 + sign * bias))
                .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

/// Reorder `layer` by its barycenters
///
/// Equal means keep their current order. Nodes without a mean go last, in
/// the order they had.
pub fn sort_by_barycenter(layer: &mut Vec<usize>, means: &[Option<f64>]) {
    let mut anchored: Vec<(usize, f64)> = Vec::with_capacity(layer.len());
    let mut loose = Vec::new();
    for (i, &node) in layer.iter().enumerate() {
        match means.get(i).copied().flatten() {
            Some(mean) => anchored.push((node, mean)),
            None => loose.push(node),
        }
    }

    anchored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    *layer = anchored.into_iter().map(|(node, _)| node).chain(loose).collect();
}

fn reorder(layer: &mut Vec<usize>, reference: &[usize], graph: &LayoutGraph<'_>, sweep: Sweep) {
    let means = barycenters(layer, reference, graph, sweep);
    sort_by_barycenter(layer, &means);
}

fn run_pass(graph: &LayoutGraph<'_>, layers: &mut [Vec<usize>], sweep: Sweep) {
    let last = layers.len() - 1;
    match sweep {
        Sweep::Down => {
            for i in 1..=last {
                let (above, rest) = layers.split_at_mut(i);
                reorder(&mut rest[0], &above[i - 1], graph, sweep);
            }
        }
        Sweep::Up => {
            for i in (0..last).rev() {
                let (head, below) = layers.split_at_mut(i + 1);
                reorder(&mut head[i], &below[0], graph, sweep);
            }
        }
    }
}

/// Run `passes` alternating down/up passes and keep the best ordering seen
///
/// Orderings are ranked by (crossings, yes/no inversions); a pass result
/// replaces the kept one only when strictly lower. Returns the crossings of
/// the ordering left in `layers`.
pub fn reduce_crossings(
    graph: &LayoutGraph<'_>,
    layers: &mut Vec<Vec<usize>>,
    passes: usize,
) -> usize {
    if layers.len() < 2 {
        return 0;
    }

    let score = |layers: &[Vec<usize>]| {
        (
            count_crossings(layers, graph),
            branch_inversions(layers, graph),
        )
    };
    let mut kept = (score(layers.as_slice()), layers.clone());

    for pass in 0..passes {
        let sweep = if pass % 2 == 0 { Sweep::Down } else { Sweep::Up };
        run_pass(graph, layers, sweep);

        let candidate = score(layers.as_slice());
        trace!(pass, ?sweep, crossings = candidate.0, inversions = candidate.1, "Ordering pass finished");
        if candidate < kept.0 {
            kept = (candidate, layers.clone());
        }
    }

    let ((crossings, _), best) = kept;
    *layers = best;
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ControlData, Edge, Handle, Node, Position};

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter()
            .map(|id| Node::control(*id, ControlData::default(), Position::default()))
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs.iter().map(|(a, b)| Edge::new(*a, *b)).collect()
    }

    #[test]
    fn test_parallel_edges_do_not_cross() {
        let n = nodes(&["A", "B", "C", "D"]);
        let e = edges(&[("A", "C"), ("B", "D")]);
        let graph = LayoutGraph::build(&n, &e).unwrap();
        assert_eq!(count_crossings(&[vec![0, 1], vec![2, 3]], &graph), 0);
    }

    #[test]
    fn test_x_shape_crosses_once() {
        let n = nodes(&["A", "B", "C", "D"]);
        let e = edges(&[("A", "D"), ("B", "C")]);
        let graph = LayoutGraph::build(&n, &e).unwrap();
        assert_eq!(count_crossings(&[vec![0, 1], vec![2, 3]], &graph), 1);
    }

    #[test]
    fn test_shared_endpoints_do_not_cross() {
        // A fans out to C and D, B feeds D as well
        let n = nodes(&["A", "B", "C", "D"]);
        let e = edges(&[("A", "C"), ("A", "D"), ("B", "D")]);
        let graph = LayoutGraph::build(&n, &e).unwrap();
        assert_eq!(count_crossings(&[vec![0, 1], vec![2, 3]], &graph), 0);
    }

    #[test]
    fn test_crossings_summed_over_ranks() {
        let n = nodes(&["A", "B", "C", "D", "E", "F"]);
        let e = edges(&[("A", "D"), ("B", "C"), ("C", "F"), ("D", "E")]);
        let graph = LayoutGraph::build(&n, &e).unwrap();
        let layers = vec![vec![0, 1], vec![2, 3], vec![4, 5]];
        assert_eq!(count_crossings(&layers, &graph), 2);
        assert_eq!(count_crossings(&[], &graph), 0);
    }

    #[test]
    fn test_barycenter_averages_predecessors() {
        // D hangs off A (slot 0) and C (slot 2)
        let n = nodes(&["A", "B", "C", "D"]);
        let e = edges(&[("A", "D"), ("C", "D")]);
        let graph = LayoutGraph::build(&n, &e).unwrap();
        assert_eq!(barycenters(&[3], &[0, 1, 2], &graph, Sweep::Down), vec![Some(1.0)]);
        assert_eq!(barycenters(&[0, 2], &[3], &graph, Sweep::Up), vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_barycenter_without_neighbours() {
        let n = nodes(&["A", "B"]);
        let graph = LayoutGraph::build(&n, &[]).unwrap();
        assert_eq!(barycenters(&[1], &[0], &graph, Sweep::Down), vec![None]);
    }

    #[test]
    fn test_branch_bias_orders_yes_before_no() {
        let n = nodes(&["P", "NO", "YES"]);
        let e = vec![Edge::branch("P", "NO", Handle::No), Edge::branch("P", "YES", Handle::Yes)];
        let graph = LayoutGraph::build(&n, &e).unwrap();

        let down = barycenters(&[1, 2], &[0], &graph, Sweep::Down);
        assert_eq!(down, vec![Some(0.25), Some(-0.25)]);

        let mut layers = vec![vec![0], vec![1, 2]];
        assert_eq!(branch_inversions(&layers, &graph), 1);
        assert_eq!(reduce_crossings(&graph, &mut layers, 4), 0);
        assert_eq!(layers[1], vec![2, 1]);
        assert_eq!(branch_inversions(&layers, &graph), 0);
    }

    #[test]
    fn test_unanchored_nodes_go_last() {
        let mut layer = vec![0, 1, 2];
        sort_by_barycenter(&mut layer, &[None, Some(1.0), Some(0.0)]);
        assert_eq!(layer, vec![2, 1, 0]);
    }

    #[test]
    fn test_equal_means_keep_order() {
        let mut layer = vec![4, 2, 7];
        sort_by_barycenter(&mut layer, &[Some(1.0), Some(1.0), Some(1.0)]);
        assert_eq!(layer, vec![4, 2, 7]);
    }

    #[test]
    fn test_reduce_crossings_untangles_x() {
        let n = nodes(&["A", "B", "C", "D"]);
        let e = edges(&[("A", "D"), ("B", "C")]);
        let graph = LayoutGraph::build(&n, &e).unwrap();
        let mut layers = vec![vec![0, 1], vec![2, 3]];

        assert_eq!(reduce_crossings(&graph, &mut layers, 4), 0);
        assert_eq!(count_crossings(&layers, &graph), 0);
    }

    #[test]
    fn test_single_rank_untouched() {
        let n = nodes(&["A", "B"]);
        let graph = LayoutGraph::build(&n, &[]).unwrap();
        let mut layers = vec![vec![1, 0]];
        assert_eq!(reduce_crossings(&graph, &mut layers, 4), 0);
        assert_eq!(layers, vec![vec![1, 0]]);
    }
}
