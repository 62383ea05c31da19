//! Decisionflow - core of a visual decision-workflow editor
//!
//! A workflow is a start marker feeding a chain of condition ("control")
//! nodes, each branching into yes/no "decision" outcomes. This crate holds
//! everything below the canvas: the graph model, the connection grammar,
//! a layered DAG layout and the edit protocol that keeps derived labels in
//! sync with node fields.
//!
//! # Quick Start
//!
//! ```rust
//! use decisionflow::prelude::*;
//!
//! let graph = seed_graph();
//!
//! // Only start→control, control→decision and control→control are legal
//! assert!(!validate_connection(&graph, &Connection::new("3", "4")));
//!
//! // Edits recompute the derived label
//! let graph = edit_node_field(&graph, "2", FieldEdit::Value(Some("21".into())));
//! assert_eq!(graph.get_node("2").unwrap().display_label(), "age > 21");
//!
//! // Layout returns fresh positions and leaves the input alone
//! let result = layout(graph.nodes(), graph.edges(), LayoutDirection::TopToBottom).unwrap();
//! assert_eq!(result.rank("4"), Some(2));
//! ```
//!
//! # Editor Sessions
//!
//! ```rust
//! use decisionflow::prelude::*;
//!
//! let mut editor = Editor::seeded(EditorConfig::default()).with_rng_seed(42);
//! let id = editor.add_control().unwrap();
//! editor
//!     .reconnect(&Connection::new("2", id.as_str()).with_handle("no"))
//!     .unwrap();
//! editor.apply_layout(None).unwrap();
//! editor.save(&mut LogSink).unwrap();
//! ```

pub mod config;
pub mod core;
pub mod graph;
pub mod layout;
pub mod session;

pub use core::*;
pub use graph::{
    connect, edit_node_field, reconnect, seed_graph, validate_connection, FieldEdit, Graph,
    GraphSnapshot,
};
pub use layout::{layout, LayoutConfig, LayoutEngine, LayoutResult};
pub use session::{add_node, Editor, IdGenerator, LogSink, SequentialIds, SnapshotSink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::core::{
        Connection, Edge, FlowError, Handle, LayoutAlgorithm, LayoutDirection, Node, NodeData,
        NodeKind, Operator, Outcome, Parameter, Position,
    };
    pub use crate::graph::{
        connect, edit_node_field, reconnect, seed_graph, validate_connection, FieldEdit, Graph,
        GraphSnapshot,
    };
    pub use crate::layout::{layout, LayoutConfig, LayoutEngine, LayoutResult};
    pub use crate::session::{add_node, Editor, IdGenerator, LogSink, SequentialIds, SnapshotSink};
}
