//! Core type definitions for flow graphs
//!
//! This module contains the canonical data model shared by every engine
//! component: node kinds, positions, nodes, edges, the graph pair and the
//! layout direction.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Step kinds of a process or dialog flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry step, exactly one per graph
    Start,
    /// Informational step shown to the operator
    Info,
    /// Group of questions asked in one step
    QuestionGroup,
    /// Branching step, one outgoing edge per option
    Decision,
    /// Something the operator or system does
    #[default]
    Action,
    /// Terminal step
    End,
}

impl NodeKind {
    /// Parse a kind name as produced by generators and editors.
    ///
    /// Matching is case-insensitive and accepts the common aliases
    /// (`question`, `branch`, `task`, ...). Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "start" | "begin" | "entry" => Some(NodeKind::Start),
            "info" | "information" | "message" => Some(NodeKind::Info),
            "questiongroup" | "question" | "questions" => Some(NodeKind::QuestionGroup),
            "decision" | "branch" | "condition" => Some(NodeKind::Decision),
            "action" | "task" | "step" => Some(NodeKind::Action),
            "end" | "finish" | "stop" => Some(NodeKind::End),
            _ => None,
        }
    }

    /// Returns true for branching steps
    pub fn is_decision(&self) -> bool {
        matches!(self, NodeKind::Decision)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Start => write!(f, "start"),
            NodeKind::Info => write!(f, "info"),
            NodeKind::QuestionGroup => write!(f, "question_group"),
            NodeKind::Decision => write!(f, "decision"),
            NodeKind::Action => write!(f, "action"),
            NodeKind::End => write!(f, "end"),
        }
    }
}

/// Flow direction handed to the layered layout engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Top to bottom (TD or TB)
    #[serde(rename = "TD", alias = "TB")]
    TopDown,
    /// Left to right (LR)
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    /// Right to left (RL)
    #[serde(rename = "RL")]
    RightLeft,
    /// Bottom to top (BT)
    #[serde(rename = "BT")]
    BottomUp,
}

impl Direction {
    /// Parse direction from its short name (TD, TB, LR, RL, BT) or from the
    /// ELK direction names (DOWN, RIGHT, LEFT, UP)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TD" | "TB" | "DOWN" => Some(Direction::TopDown),
            "LR" | "RIGHT" => Some(Direction::LeftRight),
            "RL" | "LEFT" => Some(Direction::RightLeft),
            "BT" | "UP" => Some(Direction::BottomUp),
            _ => None,
        }
    }

    /// Name of this direction in the `elk.direction` layout option
    pub fn elk_name(&self) -> &'static str {
        match self {
            Direction::TopDown => "DOWN",
            Direction::LeftRight => "RIGHT",
            Direction::RightLeft => "LEFT",
            Direction::BottomUp => "UP",
        }
    }

    /// Returns true if this is a vertical layout (TD or BT)
    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::TopDown | Direction::BottomUp)
    }

    /// Returns true if the flow is reversed (RL or BT)
    pub fn is_reversed(&self) -> bool {
        matches!(self, Direction::RightLeft | Direction::BottomUp)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::TopDown => write!(f, "TD"),
            Direction::LeftRight => write!(f, "LR"),
            Direction::RightLeft => write!(f, "RL"),
            Direction::BottomUp => write!(f, "BT"),
        }
    }
}

/// A point on the canvas. Nodes use their top-left corner as origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Translate by an offset
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An input field collected by a step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type: field_type.into(),
        }
    }
}

/// A canonical step with every field guaranteed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: String,
    /// Step kind
    pub kind: NodeKind,
    /// Display label
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Decision branch labels
    #[serde(default)]
    pub options: Vec<String>,
    /// Top-left corner on the canvas
    pub position: Position,
}

impl Node {
    /// Create a node at the origin
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            description: None,
            fields: Vec::new(),
            options: Vec::new(),
            position: Position::default(),
        }
    }

    /// Builder-style position setter
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Builder-style options setter
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// A directed transition between two steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Branch label, used to identify decision options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    /// Create an edge with a branch label
    pub fn with_label(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(id, source, target)
        }
    }

    /// Deterministic id for a synthesized `source -> target` edge
    pub fn synthetic_id(source: &str, target: &str) -> String {
        format!("edge-{}-{}", source, target)
    }
}

/// The node/edge pair passed into and returned from every operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// The start node, if the graph has one
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Start)
    }

    /// Number of start nodes (exactly one in a well-formed graph)
    pub fn start_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Start).count()
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn out_degree(&self, node_id: &str) -> usize {
        self.edges.iter().filter(|e| e.source == node_id).count()
    }

    pub fn in_degree(&self, node_id: &str) -> usize {
        self.edges.iter().filter(|e| e.target == node_id).count()
    }
}
