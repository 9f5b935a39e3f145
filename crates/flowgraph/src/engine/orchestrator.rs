//! Graph orchestrator
//!
//! The single entry point the editor's event handlers call. It keeps the two
//! call patterns apart: a full relayout recomputes every position, an
//! incremental placement only ever positions the one new node.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, span, trace, warn, Instrument, Level};

use super::completion::complete_edges;
use super::layered::{LayeredLayoutEngine, SugiyamaEngine};
use super::normalize::{
    normalize_edges, normalize_node, normalize_nodes, retain_connected_edges, unique_id,
};
use super::placement::PlacementStrategy;
use super::primary::{primary_layout, LayoutOutcome};
use crate::core::{
    EditorSurface, FlowGraphError, Graph, LayoutConfig, Node, NodeKind, NodeRecord, Position,
    RawGraph,
};

/// Coordinates normalization, layout, completion and placement
///
/// Holds no graph state. The only mutable state is a generation counter
/// that lets callers detect relayout results computed for an outdated graph.
#[derive(Debug)]
pub struct Orchestrator<E = SugiyamaEngine> {
    config: LayoutConfig,
    engine: E,
    generation: AtomicU64,
}

impl Orchestrator<SugiyamaEngine> {
    /// Orchestrator backed by the built-in layered engine
    pub fn with_builtin_engine(config: LayoutConfig) -> Self {
        Self::new(SugiyamaEngine::new(), config)
    }
}

impl Default for Orchestrator<SugiyamaEngine> {
    fn default() -> Self {
        Self::with_builtin_engine(LayoutConfig::default())
    }
}

impl<E: LayeredLayoutEngine> Orchestrator<E> {
    pub fn new(engine: E, config: LayoutConfig) -> Self {
        Self {
            config,
            engine,
            generation: AtomicU64::new(0),
        }
    }

    /// Orchestrator for an editor surface, with that surface's node size hints
    pub fn for_surface(engine: E, surface: EditorSurface) -> Self {
        Self::new(engine, LayoutConfig::for_surface(surface))
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Mark every in-flight relayout as stale; returns the new generation
    ///
    /// Called by the editor when it changes the graph itself.
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True if no relayout, placement, removal or invalidation happened
    /// since `outcome` was started
    pub fn is_current(&self, outcome: &LayoutOutcome) -> bool {
        self.is_generation_current(outcome.generation)
    }

    /// [`Self::is_current`] for a generation number held outside Rust
    pub fn is_generation_current(&self, generation: u64) -> bool {
        generation == self.generation()
    }

    /// Canonicalize a raw graph without touching positions
    ///
    /// Edges whose endpoints do not survive normalization are dropped.
    pub fn normalize(&self, graph: RawGraph) -> Graph {
        let nodes = normalize_nodes(graph.nodes, &self.config);
        let edges = retain_connected_edges(&nodes, normalize_edges(graph.edges));
        Graph::new(nodes, edges)
    }

    /// Full relayout: normalize, lay out (with fallback), complete edges
    ///
    /// Never fails. The result carries `used_fallback` and the generation it
    /// was started at.
    pub async fn full_relayout(&self, graph: RawGraph) -> LayoutOutcome {
        let generation = self.invalidate();
        let relayout_span = span!(
            Level::INFO,
            "full_relayout",
            generation,
            node_count = graph.nodes.len(),
            edge_count = graph.edges.len()
        );

        let Graph { nodes, edges } = {
            let _enter = relayout_span.enter();
            let graph = self.normalize(graph);
            check_start_node(&graph.nodes);
            graph
        };

        let mut outcome = primary_layout(&self.engine, nodes, edges, &self.config)
            .instrument(relayout_span.clone())
            .await;

        let _enter = relayout_span.enter();
        let added = complete_edges(&outcome.nodes, &mut outcome.edges);
        outcome.generation = generation;

        info!(
            node_count = outcome.nodes.len(),
            edge_count = outcome.edges.len(),
            added_edges = added,
            used_fallback = outcome.used_fallback,
            "Full relayout completed"
        );
        outcome
    }

    /// Relayout an already canonical graph
    pub async fn relayout(&self, graph: &Graph) -> LayoutOutcome {
        self.full_relayout(RawGraph::from(graph.clone())).await
    }

    /// Incremental placement of one new node
    ///
    /// The record is normalized as if appended to `graph`, its id is made
    /// unique, and its position is allocated with `strategy` around `anchor`
    /// (or [`Self::suggest_anchor`] when `None`). Existing nodes and edges
    /// are returned unchanged.
    pub fn place_node(
        &self,
        graph: &Graph,
        record: NodeRecord,
        anchor: Option<Position>,
        strategy: PlacementStrategy,
    ) -> Graph {
        let place_span = span!(
            Level::INFO,
            "place_node",
            existing = graph.nodes.len(),
            strategy = ?strategy
        );
        let _enter = place_span.enter();

        let mut node = normalize_node(record, graph.nodes.len(), &self.config);
        let used: HashSet<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
        if used.contains(&node.id) {
            let id = unique_id(node.id.clone(), &used);
            trace!(from = %node.id, to = %id, "Renamed colliding node id");
            node.id = id;
        }

        let anchor = anchor
            .filter(Position::is_finite)
            .unwrap_or_else(|| self.suggest_anchor(graph));
        node.position = strategy.allocate(&graph.nodes, anchor, &self.config);
        self.invalidate();

        debug!(node_id = %node.id, position = %node.position, "Placed node");
        let mut nodes = graph.nodes.clone();
        nodes.push(node);
        Graph::new(nodes, graph.edges.clone())
    }

    /// Remove a node and every edge touching it
    ///
    /// The start node cannot be removed.
    pub fn remove_node(&self, graph: &Graph, node_id: &str) -> Result<Graph, FlowGraphError> {
        let node = graph.node(node_id).ok_or_else(|| {
            FlowGraphError::invalid_input(format!("Unknown node '{}'", node_id))
        })?;
        if node.kind == NodeKind::Start {
            warn!(node_id, "Refusing to remove the start node");
            return Err(FlowGraphError::invalid_input(format!(
                "Node '{}' is the start node and cannot be removed",
                node_id
            )));
        }

        let nodes: Vec<Node> = graph
            .nodes
            .iter()
            .filter(|n| n.id != node_id)
            .cloned()
            .collect();
        let edges = graph
            .edges
            .iter()
            .filter(|e| e.source != node_id && e.target != node_id)
            .cloned()
            .collect();
        self.invalidate();

        debug!(node_id, remaining = nodes.len(), "Removed node");
        Ok(Graph::new(nodes, edges))
    }

    /// Anchor for a new node when the editor supplies none: one grid row
    /// below the last node, or the origin for an empty graph
    pub fn suggest_anchor(&self, graph: &Graph) -> Position {
        graph
            .nodes
            .last()
            .map(|n| n.position.offset(0.0, self.config.grid_cell_height))
            .filter(Position::is_finite)
            .unwrap_or_default()
    }
}

fn check_start_node(nodes: &[Node]) {
    let starts = nodes.iter().filter(|n| n.kind == NodeKind::Start).count();
    if starts != 1 && !nodes.is_empty() {
        warn!(start_nodes = starts, "Graph should contain exactly one start node");
    }
}
