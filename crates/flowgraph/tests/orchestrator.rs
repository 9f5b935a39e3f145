//! Tests for the graph orchestrator's call patterns

use std::rc::Rc;

use async_trait::async_trait;
use flowgraph::engine::{CoordinateOrigin, LayeredGraph, LayeredLayoutEngine, LayeredResult};
use flowgraph::prelude::*;
use serde_json::json;

fn raw_graph(value: serde_json::Value) -> RawGraph {
    serde_json::from_value(value).unwrap()
}

fn placed_process() -> Graph {
    Graph::new(
        vec![
            Node::new("s", NodeKind::Start, "Start").at(0.0, 0.0),
            Node::new("a", NodeKind::Action, "Ticket anlegen").at(300.0, 0.0),
            Node::new("e", NodeKind::End, "Ende").at(600.0, 0.0),
        ],
        vec![Edge::new("e1", "s", "a"), Edge::new("e2", "a", "e")],
    )
}

#[tokio::test]
async fn test_full_relayout_recomputes_every_position() {
    let orchestrator = Orchestrator::default();
    let mut graph = placed_process();
    // an operator dragged a node far away
    graph.nodes[1].position = Position::new(5000.0, -3000.0);

    let outcome = orchestrator.relayout(&graph).await;
    assert!(!outcome.used_fallback);
    assert_eq!(outcome.nodes.len(), 3);
    assert_ne!(outcome.nodes[1].position, Position::new(5000.0, -3000.0));
    assert!(outcome.nodes[1].position.x > outcome.nodes[0].position.x);
    assert!(outcome.nodes[2].position.x > outcome.nodes[1].position.x);
}

#[tokio::test]
async fn test_full_relayout_with_cycle_uses_fallback() {
    let orchestrator = Orchestrator::default();
    let outcome = orchestrator
        .full_relayout(raw_graph(json!({
            "nodes": [
                {"id": "s", "type": "start"},
                {"id": "q", "type": "question"},
                {"id": "z", "type": "info"}
            ],
            "edges": [
                {"source": "s", "target": "q"},
                {"source": "q", "target": "s"}
            ]
        })))
        .await;

    assert!(outcome.used_fallback);
    assert_eq!(outcome.nodes[0].position, Position::new(0.0, 0.0));
    assert_eq!(outcome.nodes[1].position, Position::new(300.0, 0.0));
    assert_eq!(outcome.nodes[2].position, Position::new(600.0, 0.0));
    assert_eq!(outcome.nodes[1].kind, NodeKind::QuestionGroup);
    // completion runs after layout: q already has an outgoing edge, so the
    // info node stays unconnected
    assert_eq!(outcome.edges.len(), 2);
}

#[tokio::test]
async fn test_full_relayout_unavailable_engine() {
    let orchestrator = Orchestrator::new(UnavailableEngine, LayoutConfig::default());
    let outcome = orchestrator.relayout(&placed_process()).await;
    assert!(outcome.used_fallback);
    assert_eq!(outcome.nodes[2].position, Position::new(600.0, 0.0));
}

#[tokio::test]
async fn test_full_relayout_empty_graph() {
    let orchestrator = Orchestrator::default();
    let outcome = orchestrator.full_relayout(RawGraph::default()).await;
    assert!(outcome.nodes.is_empty());
    assert!(outcome.edges.is_empty());
    assert!(!outcome.used_fallback);
}

#[tokio::test]
async fn test_edges_to_missing_nodes_never_reach_layout() {
    let orchestrator = Orchestrator::default();
    let outcome = orchestrator
        .full_relayout(raw_graph(json!({
            "nodes": [{"id": "s", "type": "start"}, {"id": "e", "type": "end"}],
            "edges": [
                {"source": "s", "target": "deleted"},
                {"source": "deleted", "target": "e"}
            ]
        })))
        .await;

    assert!(!outcome.used_fallback);
    assert_eq!(outcome.edges.len(), 1);
    assert_eq!(outcome.edges[0].id, "edge-s-e");
}

#[tokio::test]
async fn test_surfaces_differ_only_in_node_size() {
    let graph = placed_process();
    let process = Orchestrator::for_surface(SugiyamaEngine::new(), EditorSurface::Process)
        .relayout(&graph)
        .await;
    let dialog = Orchestrator::for_surface(SugiyamaEngine::new(), EditorSurface::Dialog)
        .relayout(&graph)
        .await;

    assert_eq!(process.edges, dialog.edges);
    // wider dialog cards push the later layers further right
    assert!(dialog.nodes[2].position.x > process.nodes[2].position.x);
}

/// Built-in engine that hands control back to the executor first, the way
/// an engine running in the browser does
struct YieldingEngine(SugiyamaEngine);

#[async_trait(?Send)]
impl LayeredLayoutEngine for YieldingEngine {
    async fn layout(&self, graph: LayeredGraph) -> Result<LayeredResult, LayoutEngineError> {
        tokio::task::yield_now().await;
        self.0.layout(graph).await
    }

    fn origin(&self) -> CoordinateOrigin {
        self.0.origin()
    }

    fn name(&self) -> &'static str {
        "yielding"
    }
}

#[tokio::test]
async fn test_edit_during_relayout_makes_it_stale() {
    let orchestrator = Rc::new(Orchestrator::new(
        YieldingEngine(SugiyamaEngine::new()),
        LayoutConfig::default(),
    ));
    let graph = placed_process();

    let relayout = {
        let orchestrator = Rc::clone(&orchestrator);
        async move { orchestrator.relayout(&graph).await }
    };
    let edit = async {
        tokio::task::yield_now().await;
        orchestrator.invalidate()
    };
    let (outcome, edited) = tokio::join!(relayout, edit);

    assert_eq!(outcome.generation, 1);
    assert_eq!(edited, 2);
    assert!(!outcome.used_fallback);
    assert!(!orchestrator.is_current(&outcome));
    assert!(orchestrator.is_generation_current(edited));

    // the next relayout on the same orchestrator is current again
    let next = orchestrator.relayout(&placed_process()).await;
    assert_eq!(next.generation, 3);
    assert!(orchestrator.is_generation_current(next.generation));
}

#[tokio::test]
async fn test_duplicate_ids_are_laid_out_apart() {
    let orchestrator = Orchestrator::default();
    let outcome = orchestrator
        .full_relayout(raw_graph(json!({
            "nodes": [
                {"type": "start", "title": "a"},
                {"id": "node-0", "title": "b"}
            ]
        })))
        .await;

    assert_eq!(outcome.nodes[0].id, "node-0");
    assert_eq!(outcome.nodes[1].id, "node-0-2");
    assert_ne!(outcome.nodes[0].position, outcome.nodes[1].position);
    assert_eq!(outcome.edges.len(), 1);
    assert_eq!(outcome.edges[0].source, "node-0");
    assert_eq!(outcome.edges[0].target, "node-0-2");
}

#[tokio::test]
async fn test_stale_relayout_is_detectable() {
    let orchestrator = Orchestrator::default();
    let graph = placed_process();

    let first = orchestrator.relayout(&graph).await;
    let second = orchestrator.relayout(&graph).await;
    assert!(!orchestrator.is_current(&first));
    assert!(orchestrator.is_current(&second));
    assert!(second.generation > first.generation);

    let placed = orchestrator.place_node(
        &graph,
        Node::new("n", NodeKind::Info, "Hinweis").into(),
        None,
        PlacementStrategy::Radial,
    );
    assert_eq!(placed.nodes.len(), 4);
    assert!(!orchestrator.is_current(&second));
}

#[test]
fn test_incremental_placement_touches_one_node() {
    let orchestrator = Orchestrator::default();
    let graph = placed_process();

    for strategy in [PlacementStrategy::Radial, PlacementStrategy::Grid] {
        let placed = orchestrator.place_node(
            &graph,
            NodeRecord::Raw(RawNode {
                kind: Some("decision".to_string()),
                ..RawNode::default()
            }),
            Some(Position::new(300.0, 0.0)),
            strategy,
        );

        assert_eq!(&placed.nodes[..3], &graph.nodes[..]);
        assert_eq!(placed.edges, graph.edges);

        let new_node = &placed.nodes[3];
        assert_eq!(new_node.kind, NodeKind::Decision);
        assert_eq!(new_node.options, vec!["Ja", "Nein"]);
        for existing in &graph.nodes {
            assert!(
                new_node.position.distance_to(&existing.position) >= 150.0,
                "{:?} placed too close to {}",
                strategy,
                existing.id
            );
        }
    }
}

#[test]
fn test_remove_then_place() {
    let orchestrator = Orchestrator::default();
    let graph = orchestrator.remove_node(&placed_process(), "a").unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert!(graph.edges.is_empty());

    let graph = orchestrator.place_node(
        &graph,
        NodeRecord::Raw(RawNode::default()),
        Some(Position::new(300.0, 0.0)),
        PlacementStrategy::Radial,
    );
    // the freed spot is available again
    assert_eq!(graph.nodes[2].position, Position::new(300.0, 0.0));
}

#[test]
fn test_start_node_survives_removal() {
    let orchestrator = Orchestrator::default();
    let graph = placed_process();
    assert!(orchestrator.remove_node(&graph, "s").is_err());
    assert_eq!(graph.start_count(), 1);
}
