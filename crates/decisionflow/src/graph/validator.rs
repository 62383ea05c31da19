//! Connection validation
//!
//! Decides whether a proposed edge may be added to a graph. The grammar is
//! closed: only start→control, control→decision and control→control are
//! legal. Validation is a pure linear scan over the edge list and is cheap
//! enough to run on every hover.

use tracing::trace;

use super::Graph;
use crate::core::{Connection, Handle, NodeKind, Rejection};

/// The legal (source kind, target kind) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    StartToControl,
    ControlToDecision,
    ControlToControl,
}

/// Classify a kind pair against the connection grammar
pub fn classify(source: NodeKind, target: NodeKind) -> Option<ConnectionKind> {
    match (source, target) {
        (NodeKind::Start, NodeKind::Control) => Some(ConnectionKind::StartToControl),
        (NodeKind::Control, NodeKind::Decision) => Some(ConnectionKind::ControlToDecision),
        (NodeKind::Control, NodeKind::Control) => Some(ConnectionKind::ControlToControl),
        (NodeKind::Start, NodeKind::Start | NodeKind::Decision)
        | (NodeKind::Control, NodeKind::Start)
        | (NodeKind::Decision, _) => None,
    }
}

/// A connection the validator accepted, with its handle normalised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedConnection {
    pub source: String,
    pub target: String,
    /// Set only when the source is a control node
    pub handle: Option<Handle>,
    pub target_handle: Option<String>,
    pub kind: ConnectionKind,
}

/// Validate a candidate edge, reporting why it was refused
pub fn check_connection(graph: &Graph, candidate: &Connection) -> Result<AcceptedConnection, Rejection> {
    let (Some(source), Some(target)) = (candidate.source.as_deref(), candidate.target.as_deref())
    else {
        return Err(Rejection::MissingEndpoint);
    };
    if source == target {
        return Err(Rejection::SelfLoop);
    }

    // Only branching sources have per-handle slots
    let source_node = graph.get_node(source);
    let slot_handle = match source_node {
        Some(node) if node.kind().is_branching() => candidate.source_handle.as_deref(),
        _ => None,
    };

    if let Some(edge) = graph.slot_occupant(source, slot_handle) {
        return Err(Rejection::SlotOccupied {
            edge_id: edge.id.clone(),
        });
    }
    if let Some(edge) = graph.incoming(target).next() {
        return Err(Rejection::TargetOccupied {
            edge_id: edge.id.clone(),
        });
    }

    let Some(source_node) = source_node else {
        return Err(Rejection::UnknownNode {
            id: source.to_string(),
        });
    };
    let Some(target_node) = graph.get_node(target) else {
        return Err(Rejection::UnknownNode {
            id: target.to_string(),
        });
    };

    let kind = classify(source_node.kind(), target_node.kind()).ok_or(Rejection::IllegalPair {
        source: source_node.kind(),
        target: target_node.kind(),
    })?;

    let handle = match kind {
        ConnectionKind::ControlToDecision | ConnectionKind::ControlToControl => {
            let parsed = slot_handle.and_then(Handle::parse);
            if parsed.is_none() {
                return Err(Rejection::InvalidHandle {
                    handle: candidate.source_handle.clone(),
                });
            }
            parsed
        }
        ConnectionKind::StartToControl => None,
    };

    trace!(source, target, ?kind, ?handle, "Connection accepted");
    Ok(AcceptedConnection {
        source: source.to_string(),
        target: target.to_string(),
        handle,
        target_handle: candidate.target_handle.clone(),
        kind,
    })
}

/// Boolean form used by the shell while the user drags a connection
pub fn validate_connection(graph: &Graph, candidate: &Connection) -> bool {
    match check_connection(graph, candidate) {
        Ok(_) => true,
        Err(reason) => {
            trace!(?candidate, %reason, "Connection rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ControlData, Node, Outcome, Position};

    fn nodes_only() -> Graph {
        Graph::from_parts(
            vec![
                Node::start("1", Position::default()),
                Node::control("2", ControlData::default(), Position::default()),
                Node::control("5", ControlData::default(), Position::default()),
                Node::decision("3", Some(Outcome::Yes), Position::default()),
                Node::decision("4", Some(Outcome::No), Position::default()),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_classify_grammar() {
        assert_eq!(
            classify(NodeKind::Start, NodeKind::Control),
            Some(ConnectionKind::StartToControl)
        );
        assert_eq!(
            classify(NodeKind::Control, NodeKind::Decision),
            Some(ConnectionKind::ControlToDecision)
        );
        assert_eq!(
            classify(NodeKind::Control, NodeKind::Control),
            Some(ConnectionKind::ControlToControl)
        );
        assert_eq!(classify(NodeKind::Start, NodeKind::Decision), None);
        assert_eq!(classify(NodeKind::Decision, NodeKind::Control), None);
        assert_eq!(classify(NodeKind::Control, NodeKind::Start), None);
    }

    #[test]
    fn test_missing_endpoint() {
        let graph = nodes_only();
        let candidate = Connection {
            source: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(check_connection(&graph, &candidate), Err(Rejection::MissingEndpoint));
    }

    #[test]
    fn test_self_loop() {
        let graph = nodes_only();
        let candidate = Connection::new("2", "2").with_handle("yes");
        assert_eq!(check_connection(&graph, &candidate), Err(Rejection::SelfLoop));
    }

    #[test]
    fn test_unknown_nodes() {
        let graph = nodes_only();
        assert_eq!(
            check_connection(&graph, &Connection::new("9", "2")),
            Err(Rejection::UnknownNode { id: "9".into() })
        );
        assert_eq!(
            check_connection(&graph, &Connection::new("1", "9")),
            Err(Rejection::UnknownNode { id: "9".into() })
        );
    }

    #[test]
    fn test_start_handle_is_normalised() {
        let graph = nodes_only();
        let accepted = check_connection(&graph, &Connection::new("1", "2").with_handle("yes")).unwrap();
        assert_eq!(accepted.handle, None);
        assert_eq!(accepted.kind, ConnectionKind::StartToControl);
    }

    #[test]
    fn test_control_requires_branch_handle() {
        let graph = nodes_only();
        assert!(matches!(
            check_connection(&graph, &Connection::new("2", "3")),
            Err(Rejection::InvalidHandle { handle: None })
        ));
        assert!(matches!(
            check_connection(&graph, &Connection::new("2", "3").with_handle("maybe")),
            Err(Rejection::InvalidHandle { .. })
        ));
        let accepted = check_connection(&graph, &Connection::new("2", "3").with_handle("yes")).unwrap();
        assert_eq!(accepted.handle, Some(Handle::Yes));
    }

    #[test]
    fn test_decision_to_decision_rejected() {
        let graph = nodes_only();
        assert_eq!(
            check_connection(&graph, &Connection::new("3", "4")),
            Err(Rejection::IllegalPair {
                source: NodeKind::Decision,
                target: NodeKind::Decision
            })
        );
        assert!(!validate_connection(&graph, &Connection::new("3", "4")));
    }

    #[test]
    fn test_occupied_slots() {
        let graph = nodes_only()
            .with_edge_unchecked(crate::core::Edge::branch("2", "3", Handle::Yes));

        assert!(matches!(
            check_connection(&graph, &Connection::new("2", "4").with_handle("yes")),
            Err(Rejection::SlotOccupied { .. })
        ));
        assert!(matches!(
            check_connection(&graph, &Connection::new("5", "3").with_handle("no")),
            Err(Rejection::TargetOccupied { .. })
        ));
        assert!(validate_connection(
            &graph,
            &Connection::new("2", "4").with_handle("no")
        ));
    }
}
