//! Flowgraph - layout engine for process and dialog flow editors
//!
//! Takes typed steps (start, question group, decision, action, info, end)
//! and the transitions between them, and returns a positioned, edge-complete
//! graph. A layered layout engine does the heavy lifting; when it fails, a
//! breadth-first fallback layout takes over so a layout always comes back.
//!
//! # Quick Start
//!
//! ```rust
//! use flowgraph::prelude::*;
//!
//! let graph = parse_graph(
//!     r#"{"nodes": [{"id": "s", "type": "start", "label": "Start"}], "edges": []}"#,
//! )
//! .unwrap();
//! assert_eq!(graph.nodes.len(), 1);
//!
//! // Incremental placement never moves existing nodes
//! let orchestrator = Orchestrator::default();
//! let current = Graph::new(vec![Node::new("s", NodeKind::Start, "Start")], vec![]);
//! let placed = orchestrator.place_node(
//!     &current,
//!     Node::new("a", NodeKind::Action, "Rückruf").into(),
//!     None,
//!     PlacementStrategy::Grid,
//! );
//! assert_eq!(placed.nodes[0], current.nodes[0]);
//! ```
//!
//! Full relayouts are asynchronous because the layered engine may be
//! backed by a JS promise; see [`Orchestrator::full_relayout`].

pub mod core;
pub mod engine;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use crate::core::*;
pub use engine::{LayoutOutcome, Orchestrator, PlacementStrategy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Direction, EditorSurface, Edge, Field, FlowGraphError, Graph, LayoutConfig,
        LayoutEngineError, Node, NodeKind, NodeRecord, Position, RawEdge, RawGraph, RawNode,
    };
    pub use crate::engine::{
        LayeredLayoutEngine, LayoutOutcome, Orchestrator, PlacementStrategy, PositionAllocator,
        SugiyamaEngine, UnavailableEngine,
    };
    pub use crate::{complete_graph, layout, parse_graph};
}

/// Parse a `{nodes, edges}` JSON document of any node shape
///
/// # Example
/// ```rust
/// use flowgraph::parse_graph;
///
/// let graph = parse_graph(r#"{"nodes": [{"title": "Begrüßung"}]}"#).unwrap();
/// assert_eq!(graph.nodes.len(), 1);
/// assert!(parse_graph("[1, 2]").is_err());
/// ```
pub fn parse_graph(input: &str) -> Result<RawGraph, FlowGraphError> {
    RawGraph::from_json(input)
}

/// Full relayout with the built-in layered engine and default configuration
pub async fn layout(graph: RawGraph) -> LayoutOutcome {
    Orchestrator::default().full_relayout(graph).await
}

/// Add the missing transitions between consecutive steps
///
/// Returns the number of edges added.
///
/// # Example
/// ```rust
/// use flowgraph::{complete_graph, Graph, Node, NodeKind};
///
/// let mut graph = Graph::new(
///     vec![
///         Node::new("a", NodeKind::Start, "Start"),
///         Node::new("b", NodeKind::End, "Ende"),
///     ],
///     vec![],
/// );
/// assert_eq!(complete_graph(&mut graph), 1);
/// assert_eq!(graph.edges[0].id, "edge-a-b");
/// ```
pub fn complete_graph(graph: &mut Graph) -> usize {
    engine::complete_edges(&graph.nodes, &mut graph.edges)
}
