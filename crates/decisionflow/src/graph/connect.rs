//! Edge construction
//!
//! Turns a validated connection into an edge and inserts it. Branch edges
//! leaving a control node are labelled `"true"` (yes) or `"false"` (no);
//! all other edges are unlabelled.

use tracing::{debug, info_span};

use super::validator::{check_connection, AcceptedConnection};
use super::Graph;
use crate::core::{Connection, Edge, FlowError, Rejection};

fn build_edge(accepted: AcceptedConnection) -> Edge {
    let handle = accepted.handle;
    Edge {
        id: Edge::derive_id(&accepted.source, &accepted.target, handle.map(|h| h.as_str())),
        source: accepted.source,
        target: accepted.target,
        source_handle: handle.map(|h| h.as_str().to_string()),
        target_handle: accepted.target_handle,
        label: handle.map(|h| h.edge_label().to_string()),
    }
}

/// Add the candidate edge if the validator accepts it
///
/// On rejection the input graph is untouched and the reason is returned as
/// `FlowError::InvalidConnection` (or `FlowError::UnknownNode`). An edge
/// whose id is already taken fails with `FlowError::InvariantViolation`.
pub fn connect(graph: &Graph, candidate: &Connection) -> Result<Graph, FlowError> {
    let span = info_span!("connect", source = ?candidate.source, target = ?candidate.target);
    let _enter = span.enter();

    let accepted = check_connection(graph, candidate).map_err(FlowError::rejected)?;
    let edge = build_edge(accepted);
    debug!(edge_id = %edge.id, "Connection created");
    graph.with_edge(edge)
}

/// Add the candidate edge, first evicting whatever fills its slots
///
/// Any edge occupying the source's outgoing slot and any edge already
/// entering the target are removed before validation. If the candidate is
/// still illegal the original graph is left as it was.
pub fn reconnect(graph: &Graph, candidate: &Connection) -> Result<Graph, FlowError> {
    let span = info_span!("reconnect", source = ?candidate.source, target = ?candidate.target);
    let _enter = span.enter();

    let (Some(source), Some(target)) = (candidate.source.as_deref(), candidate.target.as_deref())
    else {
        return Err(FlowError::rejected(Rejection::MissingEndpoint));
    };
    let source_node = graph
        .get_node(source)
        .ok_or_else(|| FlowError::unknown_node(source))?;

    let slot_handle = if source_node.kind().is_branching() {
        candidate.source_handle.as_deref()
    } else {
        None
    };

    let mut evicted: Vec<String> = Vec::new();
    if source != target {
        if let Some(edge) = graph.slot_occupant(source, slot_handle) {
            evicted.push(edge.id.clone());
        }
        for edge in graph.incoming(target) {
            if !evicted.contains(&edge.id) {
                evicted.push(edge.id.clone());
            }
        }
    }

    let reduced = evicted
        .iter()
        .fold(graph.clone(), |g, id| g.without_edge(id));
    let accepted = check_connection(&reduced, candidate).map_err(FlowError::rejected)?;
    let edge = build_edge(accepted);
    debug!(edge_id = %edge.id, evicted = ?evicted, "Connection replaced");
    reduced.with_edge(edge)
}
