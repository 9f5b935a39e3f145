//! Primary layout adapter
//!
//! Runs a [`LayeredLayoutEngine`] over a canonical graph and maps its
//! coordinates back onto the nodes. Any failure, from an engine error to a
//! single missing coordinate, is answered with the BFS fallback layout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, warn, Instrument, Level};

use super::fallback::fallback_layout;
use super::layered::{CoordinateOrigin, LayeredGraph, LayeredLayoutEngine, LayeredResult};
use crate::core::{Edge, Graph, LayoutConfig, LayoutEngineError, Node, Position};

/// Result of a layout run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutcome {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// True if the fallback layout produced the positions
    pub used_fallback: bool,
    /// Orchestrator generation the layout was started at
    #[serde(default)]
    pub generation: u64,
}

impl LayoutOutcome {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            used_fallback: false,
            generation: 0,
        }
    }

    /// The positioned graph
    pub fn into_graph(self) -> Graph {
        Graph::new(self.nodes, self.edges)
    }
}

/// Lay out `nodes` with `engine`, falling back to BFS leveling on failure
///
/// Edges must already reference existing nodes. Node order and every
/// non-position attribute are preserved.
pub async fn primary_layout<E>(
    engine: &E,
    mut nodes: Vec<Node>,
    edges: Vec<Edge>,
    config: &LayoutConfig,
) -> LayoutOutcome
where
    E: LayeredLayoutEngine + ?Sized,
{
    let layout_span = span!(
        Level::INFO,
        "primary_layout",
        engine = engine.name(),
        node_count = nodes.len(),
        edge_count = edges.len()
    );

    if nodes.is_empty() {
        debug!(parent: &layout_span, "Empty graph, skipping layout");
        return LayoutOutcome::empty();
    }

    let request = LayeredGraph::from_graph(&nodes, &edges, config);
    // The guard must not live across the await
    let response = engine
        .layout(request)
        .instrument(layout_span.clone())
        .await;

    let _enter = layout_span.enter();
    let applied = response
        .and_then(|result| apply_result(&mut nodes, &result, engine.origin(), config));

    let used_fallback = match applied {
        Ok(()) => {
            info!(node_count = nodes.len(), "Primary layout applied");
            false
        }
        Err(err) => {
            warn!(error = %err, engine = engine.name(), "Layered layout failed, using fallback");
            fallback_layout(&mut nodes, &edges, config);
            true
        }
    };

    LayoutOutcome {
        nodes,
        edges,
        used_fallback,
        generation: 0,
    }
}

/// Write the engine's coordinates into `nodes`
///
/// All-or-nothing: positions are only written once every node has a finite
/// coordinate pair.
fn apply_result(
    nodes: &mut [Node],
    result: &LayeredResult,
    origin: CoordinateOrigin,
    config: &LayoutConfig,
) -> Result<(), LayoutEngineError> {
    let placements: HashMap<&str, _> = result
        .children
        .iter()
        .map(|child| (child.id.as_str(), child))
        .collect();

    let mut positions = Vec::with_capacity(nodes.len());
    for node in nodes.iter() {
        let child = placements.get(node.id.as_str()).ok_or_else(|| {
            LayoutEngineError::malformed(format!("no placement for node '{}'", node.id))
        })?;
        let (Some(x), Some(y)) = (child.x, child.y) else {
            return Err(LayoutEngineError::malformed(format!(
                "missing coordinate for node '{}'",
                node.id
            )));
        };

        let position = match origin {
            CoordinateOrigin::TopLeft => Position::new(x, y),
            CoordinateOrigin::Center => {
                let width = child.width.unwrap_or(config.node_width);
                let height = child.height.unwrap_or(config.node_height);
                Position::new(x - width / 2.0, y - height / 2.0)
            }
        };
        if !position.is_finite() {
            return Err(LayoutEngineError::malformed(format!(
                "non-finite coordinate for node '{}'",
                node.id
            )));
        }
        positions.push(position);
    }

    for (node, position) in nodes.iter_mut().zip(positions) {
        node.position = position;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NodeKind;
    use crate::engine::layered::LayeredPlacement;

    fn nodes() -> Vec<Node> {
        vec![
            Node::new("a", NodeKind::Start, "A"),
            Node::new("b", NodeKind::End, "B"),
        ]
    }

    #[test]
    fn test_apply_top_left() {
        let mut nodes = nodes();
        let result = LayeredResult {
            children: vec![
                LayeredPlacement::new("b", 300.0, 0.0),
                LayeredPlacement::new("a", 0.0, 0.0),
            ],
        };
        apply_result(
            &mut nodes,
            &result,
            CoordinateOrigin::TopLeft,
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(nodes[0].position, Position::new(0.0, 0.0));
        assert_eq!(nodes[1].position, Position::new(300.0, 0.0));
    }

    #[test]
    fn test_apply_center_recentres() {
        let mut nodes = nodes();
        let result = LayeredResult {
            children: vec![
                LayeredPlacement::new("a", 110.0, 40.0).with_size(220.0, 80.0),
                // no size reported: the configured hint is used
                LayeredPlacement::new("b", 500.0, 40.0),
            ],
        };
        apply_result(
            &mut nodes,
            &result,
            CoordinateOrigin::Center,
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(nodes[0].position, Position::new(0.0, 0.0));
        assert_eq!(nodes[1].position, Position::new(390.0, 0.0));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut nodes = vec![
            Node::new("a", NodeKind::Start, "A").at(1.0, 2.0),
            Node::new("b", NodeKind::End, "B").at(3.0, 4.0),
        ];
        let result = LayeredResult {
            children: vec![LayeredPlacement::new("a", 100.0, 100.0)],
        };
        let err = apply_result(
            &mut nodes,
            &result,
            CoordinateOrigin::TopLeft,
            &LayoutConfig::default(),
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("'b'"));
        assert_eq!(nodes[0].position, Position::new(1.0, 2.0));
    }

    #[test]
    fn test_apply_rejects_nan() {
        let mut nodes = nodes();
        let result = LayeredResult {
            children: vec![
                LayeredPlacement::new("a", f64::NAN, 0.0),
                LayeredPlacement::new("b", 0.0, 0.0),
            ],
        };
        assert!(apply_result(
            &mut nodes,
            &result,
            CoordinateOrigin::TopLeft,
            &LayoutConfig::default()
        )
        .is_err());
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let value = serde_json::to_value(LayoutOutcome::empty()).unwrap();
        assert_eq!(value["usedFallback"], false);
        assert!(value["nodes"].as_array().unwrap().is_empty());
    }
}
