//! Node edit synchronization
//!
//! A single entry point, [`edit_node_field`], applies one field change to
//! the latest graph snapshot and recomputes whatever the node displays from
//! that field. Sequential edits must each be applied to the snapshot the
//! previous edit returned.

use std::fmt;
use tracing::{debug, warn};

use super::Graph;
use crate::core::{FlowError, NodeData, Operator, Outcome, Parameter};

/// One typed change to a node's editable fields
///
/// `None` clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Parameter(Option<Parameter>),
    Operator(Option<Operator>),
    Value(Option<String>),
    Outcome(Option<Outcome>),
}

impl FieldEdit {
    /// Names accepted by [`FieldEdit::parse`]
    pub fn field_names() -> &'static [&'static str] {
        &["parameter", "operator", "value", "outcome"]
    }

    /// Build an edit from the editor panel's field name and raw value
    ///
    /// An empty (or all-whitespace) value clears the field.
    pub fn parse(field: &str, value: &str) -> Result<Self, FlowError> {
        let cleared = value.trim().is_empty();
        match field.trim().to_lowercase().as_str() {
            "parameter" => Ok(FieldEdit::Parameter(if cleared { None } else { Some(value.parse()?) })),
            "operator" => Ok(FieldEdit::Operator(if cleared { None } else { Some(value.parse()?) })),
            "value" => Ok(FieldEdit::Value(if cleared { None } else { Some(value.to_string()) })),
            "outcome" | "decision" => {
                Ok(FieldEdit::Outcome(if cleared { None } else { Some(value.parse()?) }))
            }
            other => Err(FlowError::invalid_field(
                other,
                format!("expected one of {:?}", Self::field_names()),
            )),
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            FieldEdit::Parameter(_) => "parameter",
            FieldEdit::Operator(_) => "operator",
            FieldEdit::Value(_) => "value",
            FieldEdit::Outcome(_) => "outcome",
        }
    }
}

impl fmt::Display for FieldEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldEdit::Parameter(Some(p)) => write!(f, "parameter={}", p),
            FieldEdit::Operator(Some(o)) => write!(f, "operator={}", o),
            FieldEdit::Value(Some(v)) => write!(f, "value={}", v),
            FieldEdit::Outcome(Some(o)) => write!(f, "outcome={}", o),
            cleared => write!(f, "{}=<cleared>", cleared.field_name()),
        }
    }
}

/// Apply `edit` to node `node_id`, returning the new snapshot
///
/// Only the targeted node changes. A missing node, or a field that does not
/// belong to the node's kind, yields an unchanged copy.
pub fn edit_node_field(graph: &Graph, node_id: &str, edit: FieldEdit) -> Graph {
    let Some(node) = graph.get_node(node_id) else {
        debug!(node_id, %edit, "Edit ignored, node no longer exists");
        return graph.clone();
    };

    let mut node = node.clone();
    match (&mut node.data, edit) {
        (NodeData::Control(data), FieldEdit::Parameter(parameter)) => {
            data.parameter = parameter;
            data.refresh_label();
        }
        (NodeData::Control(data), FieldEdit::Operator(operator)) => {
            data.operator = operator;
            data.refresh_label();
        }
        (NodeData::Control(data), FieldEdit::Value(value)) => {
            data.value = value;
            data.refresh_label();
        }
        (NodeData::Decision(data), FieldEdit::Outcome(outcome)) => {
            data.outcome = outcome;
            node.style = data.derived_style();
        }
        (data, edit) => {
            warn!(
                node_id,
                node_kind = %data.kind(),
                field = edit.field_name(),
                "Edit ignored, field does not apply to this node kind"
            );
            return graph.clone();
        }
    }

    debug!(node_id, label = %node.display_label(), "Node field updated");
    graph.replacing_node(node)
}
