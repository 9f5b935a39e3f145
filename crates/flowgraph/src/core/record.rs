//! Raw input records
//!
//! Generators and the manual editor hand over nodes in different shapes:
//! flat `{id, type, title, options}` objects from generation, React-Flow
//! style `{id, type, position, data: {label, ...}}` objects from the canvas,
//! and already-canonical nodes returned by an earlier call. [`NodeRecord`]
//! captures all of them; the normalizer is the only place that turns a
//! record into a [`Node`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Field, FlowGraphError, Node, Position};

/// Coerce a JSON id (string or number) to a string
///
/// Blank strings and any other JSON type count as missing.
pub fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A field description as produced by generators
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

impl RawField {
    /// Fill the gaps: name falls back to label, label to name, type to `text`
    pub fn into_field(self, index: usize) -> Field {
        let name = self
            .name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.label.clone().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| format!("field_{}", index + 1));
        let label = self
            .label
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| name.clone());
        let field_type = self
            .field_type
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "text".to_string());
        Field {
            name,
            label,
            field_type,
        }
    }
}

/// Payload nested under `data` by the canvas editor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawNodeData {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub fields: Option<Vec<RawField>>,
}

/// A node of unknown shape; every field is optional
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub fields: Option<Vec<RawField>>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub data: Option<RawNodeData>,
}

impl RawNode {
    /// The id as a string, if one was supplied
    pub fn id(&self) -> Option<String> {
        self.id.as_ref().and_then(coerce_id)
    }

    /// Kind name, top-level first, then the nested payload
    pub fn kind_name(&self) -> Option<&str> {
        self.kind
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.kind.as_deref()))
    }

    /// Label, falling back to the title (top-level, then nested)
    pub fn label_text(&self) -> Option<&str> {
        let data = self.data.as_ref();
        [
            self.label.as_deref(),
            data.and_then(|d| d.label.as_deref()),
            self.title.as_deref(),
            data.and_then(|d| d.title.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.description.as_deref()))
    }

    pub fn take_options(&mut self) -> Option<Vec<String>> {
        self.options
            .take()
            .or_else(|| self.data.as_mut().and_then(|d| d.options.take()))
    }

    pub fn take_fields(&mut self) -> Option<Vec<RawField>> {
        self.fields
            .take()
            .or_else(|| self.data.as_mut().and_then(|d| d.fields.take()))
    }
}

/// A node as handed over by a collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRecord {
    /// Already canonical, for example returned by an earlier relayout
    Canonical(Node),
    /// Anything else
    Raw(RawNode),
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        NodeRecord::Canonical(node)
    }
}

impl From<RawNode> for NodeRecord {
    fn from(raw: RawNode) -> Self {
        NodeRecord::Raw(raw)
    }
}

/// An edge of unknown shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdge {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "from")]
    pub source: Option<Value>,
    #[serde(default, alias = "to")]
    pub target: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
    /// Canvas branch handle, used as label when no label is given
    #[serde(default)]
    pub source_handle: Option<String>,
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(Value::String(source.into())),
            target: Some(Value::String(target.into())),
            ..Self::default()
        }
    }
}

/// An unnormalized graph as produced by generation or the editor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl RawGraph {
    /// Parse a graph from JSON
    ///
    /// The top level must be an object; missing `nodes`/`edges` arrays are
    /// treated as empty.
    pub fn from_json(input: &str) -> Result<Self, FlowGraphError> {
        let value: Value = serde_json::from_str(input)?;
        if !value.is_object() {
            return Err(FlowGraphError::invalid_input(
                "graph must be a JSON object with `nodes` and `edges`".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl From<super::Graph> for RawGraph {
    fn from(graph: super::Graph) -> Self {
        Self {
            nodes: graph.nodes.into_iter().map(NodeRecord::Canonical).collect(),
            edges: graph
                .edges
                .into_iter()
                .map(|e| RawEdge {
                    id: Some(Value::String(e.id)),
                    source: Some(Value::String(e.source)),
                    target: Some(Value::String(e.target)),
                    label: e.label,
                    source_handle: None,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NodeKind;
    use serde_json::json;

    #[test]
    fn test_coerce_id() {
        assert_eq!(coerce_id(&json!("a")), Some("a".to_string()));
        assert_eq!(coerce_id(&json!(7)), Some("7".to_string()));
        assert_eq!(coerce_id(&json!("  ")), None);
        assert_eq!(coerce_id(&json!(null)), None);
        assert_eq!(coerce_id(&json!({"x": 1})), None);
    }

    #[test]
    fn test_canonical_record_is_detected() {
        let record: NodeRecord = serde_json::from_value(json!({
            "id": "s",
            "kind": "start",
            "label": "Start",
            "position": {"x": 0.0, "y": 0.0}
        }))
        .unwrap();
        match record {
            NodeRecord::Canonical(node) => assert_eq!(node.kind, NodeKind::Start),
            NodeRecord::Raw(_) => panic!("expected canonical record"),
        }
    }

    #[test]
    fn test_generator_record_is_raw() {
        let record: NodeRecord = serde_json::from_value(json!({
            "id": 3,
            "type": "decision",
            "title": "Vertrag vorhanden?"
        }))
        .unwrap();
        match record {
            NodeRecord::Raw(raw) => {
                assert_eq!(raw.id(), Some("3".to_string()));
                assert_eq!(raw.kind_name(), Some("decision"));
                assert_eq!(raw.label_text(), Some("Vertrag vorhanden?"));
            }
            NodeRecord::Canonical(_) => panic!("expected raw record"),
        }
    }

    #[test]
    fn test_nested_canvas_payload() {
        let mut raw: RawNode = serde_json::from_value(json!({
            "id": "q1",
            "position": {"x": 5.0, "y": 6.0},
            "data": {"label": "Fragen", "type": "question_group", "options": ["a"]}
        }))
        .unwrap();
        assert_eq!(raw.kind_name(), Some("question_group"));
        assert_eq!(raw.label_text(), Some("Fragen"));
        assert_eq!(raw.take_options(), Some(vec!["a".to_string()]));
        assert_eq!(raw.position, Some(Position::new(5.0, 6.0)));
    }

    #[test]
    fn test_raw_field_defaults() {
        let field = RawField {
            label: Some("Kundennummer".to_string()),
            ..RawField::default()
        }
        .into_field(0);
        assert_eq!(field.name, "Kundennummer");
        assert_eq!(field.field_type, "text");

        let field = RawField::default().into_field(2);
        assert_eq!(field.name, "field_3");
        assert_eq!(field.label, "field_3");
    }

    #[test]
    fn test_raw_graph_from_json() {
        let graph = RawGraph::from_json(r#"{"nodes": [{"title": "x"}]}"#).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());

        assert!(RawGraph::from_json("[1, 2]").is_err());
        assert!(RawGraph::from_json("not json").is_err());
    }

    #[test]
    fn test_raw_edge_aliases() {
        let edge: RawEdge = serde_json::from_value(json!({
            "from": "a",
            "to": 2,
            "sourceHandle": "Ja"
        }))
        .unwrap();
        assert_eq!(edge.source.as_ref().and_then(coerce_id), Some("a".to_string()));
        assert_eq!(edge.target.as_ref().and_then(coerce_id), Some("2".to_string()));
        assert_eq!(edge.source_handle.as_deref(), Some("Ja"));
    }
}
