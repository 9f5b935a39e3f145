//! Tests for the JSON surface shared with the editor frontends

use flowgraph::prelude::*;
use serde_json::json;

#[test]
fn test_canonical_node_wire_format() {
    let node = Node::new("q", NodeKind::QuestionGroup, "Daten erfassen").at(10.0, 20.0);
    let value = serde_json::to_value(&node).unwrap();

    assert_eq!(value["kind"], "question_group");
    assert_eq!(value["position"], json!({"x": 10.0, "y": 20.0}));
    assert!(value.get("description").is_none());
    assert_eq!(value["options"], json!([]));
}

#[test]
fn test_canonical_node_round_trips_as_record() {
    let node = Node::new("d", NodeKind::Decision, "Bezahlt?")
        .at(5.0, 5.0)
        .with_options(["Ja", "Nein", "Teilweise"]);
    let record: NodeRecord = serde_json::from_value(serde_json::to_value(&node).unwrap()).unwrap();
    assert_eq!(record, NodeRecord::Canonical(node));
}

#[test]
fn test_record_without_position_is_raw() {
    let record: NodeRecord =
        serde_json::from_value(json!({"id": "a", "kind": "action", "label": "Senden"})).unwrap();
    assert!(matches!(record, NodeRecord::Raw(_)));
}

#[test]
fn test_parse_graph_rejects_non_objects() {
    assert!(parse_graph("[]").is_err());
    assert!(parse_graph("not json").is_err());

    let graph = parse_graph("{}").unwrap();
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
}

#[test]
fn test_raw_edge_aliases() {
    let graph = parse_graph(
        r#"{"nodes": [], "edges": [{"from": "a", "to": "b", "sourceHandle": "Ja"}]}"#,
    )
    .unwrap();
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].source_handle.as_deref(), Some("Ja"));
}

#[tokio::test]
async fn test_outcome_wire_format() {
    let graph = parse_graph(
        r#"{"nodes": [{"id": "s", "type": "start"}, {"id": "e", "type": "end"}], "edges": []}"#,
    )
    .unwrap();
    let outcome = layout(graph).await;
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["usedFallback"], false);
    assert!(value["generation"].as_u64().unwrap() >= 1);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    // completion connected start to end
    assert_eq!(value["edges"][0]["id"], "edge-s-e");

    let back: LayoutOutcome = serde_json::from_value(value).unwrap();
    assert_eq!(back, outcome);
}

#[test]
fn test_outcome_generation_is_optional_on_input() {
    let outcome: LayoutOutcome =
        serde_json::from_value(json!({"nodes": [], "edges": [], "usedFallback": true})).unwrap();
    assert!(outcome.used_fallback);
    assert_eq!(outcome.generation, 0);
}

#[test]
fn test_config_json_overrides() {
    let config = LayoutConfig::from_json(
        r#"{"minNodeDistance": 90, "direction": "TD", "decisionOptions": ["Yes", "No"]}"#,
    )
    .unwrap();
    assert_eq!(config.min_node_distance, 90.0);
    assert_eq!(config.direction, Direction::TopDown);
    assert_eq!(config.decision_options, vec!["Yes", "No"]);
    // untouched keys keep their defaults
    assert_eq!(config.radial_step, 200.0);
    assert_eq!(config.bfs_spacing_x, 300.0);
}

#[test]
fn test_config_json_validation() {
    let err = LayoutConfig::from_json(r#"{"radialStep": 0}"#).unwrap_err();
    assert!(format!("{}", err).contains("radialStep"));

    let err = LayoutConfig::from_json(r#"{"seedColumns": 0}"#).unwrap_err();
    assert!(format!("{}", err).contains("seedColumns"));

    assert!(LayoutConfig::from_json(r#"{"minNodeDistance": "far"}"#).is_err());
}

#[test]
fn test_config_from_missing_file() {
    let err = LayoutConfig::from_file("/definitely/not/here/flowgraph.json").unwrap_err();
    assert!(matches!(err, FlowGraphError::IoError { .. }));
}

#[test]
fn test_complete_graph_helper() {
    let mut graph = Graph::new(
        vec![
            Node::new("a", NodeKind::Start, "Start"),
            Node::new("b", NodeKind::End, "Ende"),
        ],
        Vec::new(),
    );
    assert_eq!(complete_graph(&mut graph), 1);
    assert_eq!(complete_graph(&mut graph), 0);
    assert_eq!(graph.edges[0], Edge::new("edge-a-b", "a", "b"));
}
