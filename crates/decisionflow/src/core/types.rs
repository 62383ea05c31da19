//! Core type definitions for decision workflows
//!
//! This module contains the fundamental types used throughout decisionflow:
//! node kinds, the typed per-kind node data, edges, handles, geometry and
//! layout direction.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use super::FlowError;

/// Text shown on a control node until its condition is complete
pub const CONTROL_PLACEHOLDER: &str = "right-click to edit";

/// Fixed label of the start marker
pub const START_LABEL: &str = "START";

/// Border colour for accepting decision nodes
pub const YES_COLOR: &str = "#89dd68";

/// Border colour for rejecting decision nodes
pub const NO_COLOR: &str = "#dd6868";

/// The closed vocabulary of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Entry marker feeding the first condition
    Start,
    /// A single comparison with yes/no branches
    Control,
    /// Terminal accept/reject outcome
    Decision,
}

impl NodeKind {
    /// All kinds, in declaration order
    pub fn all() -> [NodeKind; 3] {
        [NodeKind::Start, NodeKind::Control, NodeKind::Decision]
    }

    /// Returns true if nodes of this kind fan out through named handles
    pub fn is_branching(&self) -> bool {
        matches!(self, NodeKind::Control)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Start => write!(f, "start"),
            NodeKind::Control => write!(f, "control"),
            NodeKind::Decision => write!(f, "decision"),
        }
    }
}

/// Applicant attributes a control node can test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "net worth")]
    NetWorth,
    #[serde(rename = "dependants")]
    Dependants,
}

impl Parameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Age => "age",
            Parameter::Income => "income",
            Parameter::NetWorth => "net worth",
            Parameter::Dependants => "dependants",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "age" => Ok(Parameter::Age),
            "income" => Ok(Parameter::Income),
            "net worth" | "net_worth" | "networth" => Ok(Parameter::NetWorth),
            "dependants" => Ok(Parameter::Dependants),
            other => Err(FlowError::invalid_field(
                "parameter",
                format!("unknown parameter '{}'", other),
            )),
        }
    }
}

/// Comparison operators available to control nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            other => Err(FlowError::invalid_field(
                "operator",
                format!("unknown operator '{}'", other),
            )),
        }
    }
}

/// Accept/reject outcome, also used to name control node branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "yes",
            Outcome::No => "no",
        }
    }

    /// Border colour used when drawing a decision with this outcome
    pub fn border_color(&self) -> &'static str {
        match self {
            Outcome::Yes => YES_COLOR,
            Outcome::No => NO_COLOR,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(Outcome::Yes),
            "no" => Ok(Outcome::No),
            other => Err(FlowError::invalid_field(
                "outcome",
                format!("unknown outcome '{}'", other),
            )),
        }
    }
}

/// Named outgoing connection point on a control node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Yes,
    No,
}

impl Handle {
    /// Parse a raw handle id as the shell reports it
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "yes" => Some(Handle::Yes),
            "no" => Some(Handle::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Handle::Yes => "yes",
            Handle::No => "no",
        }
    }

    /// Edge label for a branch leaving through this handle
    pub fn edge_label(&self) -> &'static str {
        match self {
            Handle::Yes => "true",
            Handle::No => "false",
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis along which rank increases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutDirection {
    /// Ranks grow downward along y
    #[default]
    TopToBottom,
    /// Ranks grow rightward along x
    LeftToRight,
}

impl LayoutDirection {
    /// Returns true if ranks are stacked vertically
    pub fn is_vertical(&self) -> bool {
        matches!(self, LayoutDirection::TopToBottom)
    }

    /// Get all valid direction names
    pub fn variants() -> &'static [&'static str] {
        &["top-to-bottom", "left-to-right"]
    }
}

impl FromStr for LayoutDirection {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top-to-bottom" | "tb" | "td" => Ok(LayoutDirection::TopToBottom),
            "left-to-right" | "lr" => Ok(LayoutDirection::LeftToRight),
            other => Err(FlowError::config_error(format!(
                "unknown layout direction '{}', expected one of {:?}",
                other,
                Self::variants()
            ))),
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutDirection::TopToBottom => write!(f, "top-to-bottom"),
            LayoutDirection::LeftToRight => write!(f, "left-to-right"),
        }
    }
}

/// Top-left corner of a node on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of a node's bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Finite and strictly positive in both dimensions
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Visual hints passed through to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

impl NodeStyle {
    pub fn bordered(color: impl Into<String>) -> Self {
        Self {
            border_color: Some(color.into()),
        }
    }
}

/// Data carried by the start marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartData {
    pub label: String,
}

impl Default for StartData {
    fn default() -> Self {
        Self {
            label: START_LABEL.to_string(),
        }
    }
}

/// Condition fields of a control node
///
/// `display_label` is derived from the other three fields; see
/// [`ControlData::refresh_label`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlData {
    #[serde(default)]
    pub parameter: Option<Parameter>,
    #[serde(default)]
    pub operator: Option<Operator>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default = "placeholder_label")]
    pub display_label: String,
}

fn placeholder_label() -> String {
    CONTROL_PLACEHOLDER.to_string()
}

impl Default for ControlData {
    fn default() -> Self {
        Self {
            parameter: None,
            operator: None,
            value: None,
            display_label: placeholder_label(),
        }
    }
}

impl ControlData {
    /// Build a complete condition with its label already derived
    pub fn condition(parameter: Parameter, operator: Operator, value: impl Into<String>) -> Self {
        let mut data = Self {
            parameter: Some(parameter),
            operator: Some(operator),
            value: Some(value.into()),
            display_label: placeholder_label(),
        };
        data.refresh_label();
        data
    }

    /// The label the fields currently imply
    pub fn derived_label(&self) -> String {
        match (&self.parameter, &self.operator, self.value.as_deref()) {
            (Some(parameter), Some(operator), Some(value)) if !value.trim().is_empty() => {
                format!("{} {} {}", parameter, operator, value)
            }
            _ => placeholder_label(),
        }
    }

    /// Recompute `display_label` from the condition fields
    pub fn refresh_label(&mut self) {
        self.display_label = self.derived_label();
    }

    /// Returns true if all three condition fields are set
    pub fn is_complete(&self) -> bool {
        self.derived_label() != CONTROL_PLACEHOLDER
    }
}

/// Outcome held by a decision node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecisionData {
    #[serde(default)]
    pub outcome: Option<Outcome>,
}

impl DecisionData {
    pub fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome: Some(outcome),
        }
    }

    pub fn display_label(&self) -> String {
        match self.outcome {
            Some(outcome) => format!("decision={}", outcome),
            None => "decision".to_string(),
        }
    }

    /// Style implied by the outcome, if any
    pub fn derived_style(&self) -> Option<NodeStyle> {
        self.outcome.map(|o| NodeStyle::bordered(o.border_color()))
    }
}

/// Per-kind node payload; the variant is the node's type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeData {
    Start(StartData),
    Control(ControlData),
    Decision(DecisionData),
}

impl NodeData {
    /// Default (empty) data for a freshly added node of `kind`
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Start => NodeData::Start(StartData::default()),
            NodeKind::Control => NodeData::Control(ControlData::default()),
            NodeKind::Decision => NodeData::Decision(DecisionData::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Start(_) => NodeKind::Start,
            NodeData::Control(_) => NodeKind::Control,
            NodeData::Decision(_) => NodeKind::Decision,
        }
    }

    /// Text the renderer shows inside the node
    pub fn display_label(&self) -> String {
        match self {
            NodeData::Start(data) => data.label.clone(),
            NodeData::Control(data) => data.display_label.clone(),
            NodeData::Decision(data) => data.display_label(),
        }
    }
}

/// A node in the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
}

impl Node {
    /// Create a node with its label and style derived from `data`
    pub fn new(id: impl Into<String>, data: NodeData, position: Position) -> Self {
        let mut node = Self {
            id: id.into(),
            position,
            data,
            size: None,
            style: None,
        };
        node.refresh_derived();
        node
    }

    /// Recompute the control label and the decision border from the fields
    ///
    /// Start nodes keep whatever style they carry.
    pub fn refresh_derived(&mut self) {
        match &mut self.data {
            NodeData::Control(control) => control.refresh_label(),
            NodeData::Decision(decision) => self.style = decision.derived_style(),
            NodeData::Start(_) => {}
        }
    }

    pub fn start(id: impl Into<String>, position: Position) -> Self {
        Self::new(id, NodeData::Start(StartData::default()), position)
    }

    pub fn control(id: impl Into<String>, data: ControlData, position: Position) -> Self {
        Self::new(id, NodeData::Control(data), position)
    }

    pub fn decision(id: impl Into<String>, outcome: Option<Outcome>, position: Position) -> Self {
        Self::new(id, NodeData::Decision(DecisionData { outcome }), position)
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn display_label(&self) -> String {
        self.data.display_label()
    }
}

fn escape_id_part(part: &str) -> Cow<'_, str> {
    if part.contains(|c: char| c == '-' || c == '\\') {
        Cow::Owned(part.replace('\\', "\\\\").replace('-', "\\-"))
    } else {
        Cow::Borrowed(part)
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Deterministic edge id: `e<source>-<target>[-<handle>]`
    ///
    /// A `-` or `\` inside a part gets a leading `\`, so distinct
    /// endpoints never share an id (`1`→`2-3` is `e1-2\-3`, `1-2`→`3` is
    /// `e1\-2-3`).
    pub fn derive_id(source: &str, target: &str, source_handle: Option<&str>) -> String {
        let (source, target) = (escape_id_part(source), escape_id_part(target));
        match source_handle {
            Some(handle) => format!("e{}-{}-{}", source, target, escape_id_part(handle)),
            None => format!("e{}-{}", source, target),
        }
    }

    /// Unlabelled edge with a derived id
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: Self::derive_id(&source, &target, None),
            source,
            target,
            source_handle: None,
            target_handle: None,
            label: None,
        }
    }

    /// Branch edge leaving a control node through `handle`
    pub fn branch(source: impl Into<String>, target: impl Into<String>, handle: Handle) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: Self::derive_id(&source, &target, Some(handle.as_str())),
            source,
            target,
            source_handle: Some(handle.as_str().to_string()),
            target_handle: None,
            label: Some(handle.edge_label().to_string()),
        }
    }

    /// Parsed source handle, if it names a known branch
    pub fn handle(&self) -> Option<Handle> {
        self.source_handle.as_deref().and_then(Handle::parse)
    }
}

/// A proposed edge as reported by the shell on drag-release
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}
