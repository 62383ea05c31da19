//! Core error types for workflow graph operations
//!
//! This module defines the error taxonomy shared by the graph model, the
//! connection validator, the edit protocol and the layout engine.

use std::fmt;
use thiserror::Error;

use super::NodeKind;

/// Why a proposed connection was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Source or target was not supplied
    MissingEndpoint,
    /// Source and target are the same node
    SelfLoop,
    /// The source's outgoing slot already holds an edge
    SlotOccupied { edge_id: String },
    /// The target already has an incoming edge
    TargetOccupied { edge_id: String },
    /// An endpoint id does not resolve to a node
    UnknownNode { id: String },
    /// The (source, target) kind pair is outside the grammar
    IllegalPair { source: NodeKind, target: NodeKind },
    /// A control node must connect through `yes` or `no`
    InvalidHandle { handle: Option<String> },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingEndpoint => write!(f, "source and target are required"),
            Rejection::SelfLoop => write!(f, "a node cannot connect to itself"),
            Rejection::SlotOccupied { edge_id } => {
                write!(f, "outgoing slot already used by edge '{}'", edge_id)
            }
            Rejection::TargetOccupied { edge_id } => {
                write!(f, "target already fed by edge '{}'", edge_id)
            }
            Rejection::UnknownNode { id } => write!(f, "node '{}' does not exist", id),
            Rejection::IllegalPair { source, target } => {
                write!(f, "{} nodes cannot connect to {} nodes", source, target)
            }
            Rejection::InvalidHandle { handle } => match handle {
                Some(h) => write!(f, "control nodes branch through 'yes' or 'no', not '{}'", h),
                None => write!(f, "control nodes branch through 'yes' or 'no'"),
            },
        }
    }
}

/// Error types for workflow graph operations
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid connection: {reason}")]
    InvalidConnection { reason: Rejection },

    #[error("Unknown node: {id}")]
    UnknownNode { id: String },

    #[error("Malformed layout input: {message}")]
    MalformedLayoutInput { message: String },

    #[error("Duplicate node id: {id}")]
    DuplicateNodeId { id: String },

    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl FlowError {
    /// Wrap a validator rejection, surfacing unknown nodes as their own variant
    pub fn rejected(reason: Rejection) -> Self {
        match reason {
            Rejection::UnknownNode { id } => Self::UnknownNode { id },
            reason => Self::InvalidConnection { reason },
        }
    }

    pub fn unknown_node(id: impl Into<String>) -> Self {
        Self::UnknownNode { id: id.into() }
    }

    pub fn malformed_layout(message: impl Into<String>) -> Self {
        Self::MalformedLayoutInput {
            message: message.into(),
        }
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true for failures the shell should treat as no-op feedback
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            FlowError::InvalidConnection { .. } | FlowError::UnknownNode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_connection_message() {
        let error = FlowError::rejected(Rejection::IllegalPair {
            source: NodeKind::Decision,
            target: NodeKind::Decision,
        });
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Invalid connection"));
        assert!(error_msg.contains("decision nodes cannot connect to decision nodes"));
        assert!(error.is_rejection());
    }

    #[test]
    fn test_unknown_node_rejection_is_promoted() {
        let error = FlowError::rejected(Rejection::UnknownNode { id: "9".into() });
        assert!(matches!(error, FlowError::UnknownNode { ref id } if id == "9"));
    }

    #[test]
    fn test_layout_error() {
        let error = FlowError::malformed_layout("cycle through 2, 3");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Malformed layout input"));
        assert!(error_msg.contains("cycle through 2, 3"));
        assert!(!error.is_rejection());
    }

    #[test]
    fn test_invalid_field_error() {
        let error = FlowError::invalid_field("operator", "unknown operator '=>'");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("'operator'"));
        assert!(error_msg.contains("=>"));
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: FlowError = io_err.into();
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("File not found"));
    }
}
