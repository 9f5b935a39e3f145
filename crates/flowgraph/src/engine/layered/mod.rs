//! Layered layout seam
//!
//! The primary layout is delegated to a layered (Sugiyama-style) layout
//! engine behind the [`LayeredLayoutEngine`] trait. Requests and results are
//! shaped like ELK JSON graphs so an elkjs instance on the JS side can serve
//! as the engine without any translation.

mod builtin;

pub use builtin::SugiyamaEngine;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Direction, Edge, LayoutConfig, LayoutEngineError, Node};

/// Layout option key selecting the algorithm
pub const OPTION_ALGORITHM: &str = "elk.algorithm";
/// Layout option key for the flow direction
pub const OPTION_DIRECTION: &str = "elk.direction";
/// Layout option key for spacing between nodes of one layer
pub const OPTION_NODE_SPACING: &str = "elk.spacing.nodeNode";
/// Layout option key for spacing between layers
pub const OPTION_LAYER_SPACING: &str = "elk.layered.spacing.nodeNodeBetweenLayers";

/// Id of the root graph in every request
pub const ROOT_ID: &str = "root";

/// Which point of a node the engine's coordinates refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateOrigin {
    /// Coordinates are the node's top-left corner (ELK)
    #[default]
    TopLeft,
    /// Coordinates are the node's centre
    Center,
}

/// A node in a layout request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// An edge in a layout request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredEdge {
    pub id: String,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
}

/// A layout request: the root graph handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayeredGraph {
    pub id: String,
    #[serde(default)]
    pub layout_options: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<LayeredNode>,
    #[serde(default)]
    pub edges: Vec<LayeredEdge>,
}

impl LayeredGraph {
    /// Build the request for a canonical node and edge set
    ///
    /// Every node gets the configured size hint; ids pass through unchanged.
    pub fn from_graph(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Self {
        let mut layout_options = BTreeMap::new();
        layout_options.insert(OPTION_ALGORITHM.to_string(), "layered".to_string());
        layout_options.insert(
            OPTION_DIRECTION.to_string(),
            config.direction.elk_name().to_string(),
        );
        layout_options.insert(
            OPTION_NODE_SPACING.to_string(),
            config.node_spacing.to_string(),
        );
        layout_options.insert(
            OPTION_LAYER_SPACING.to_string(),
            config.layer_spacing.to_string(),
        );

        Self {
            id: ROOT_ID.to_string(),
            layout_options,
            children: nodes
                .iter()
                .map(|n| LayeredNode {
                    id: n.id.clone(),
                    width: config.node_width,
                    height: config.node_height,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|e| LayeredEdge {
                    id: e.id.clone(),
                    sources: vec![e.source.clone()],
                    targets: vec![e.target.clone()],
                })
                .collect(),
        }
    }

    /// Raw value of a layout option
    pub fn option(&self, key: &str) -> Option<&str> {
        self.layout_options.get(key).map(String::as_str)
    }

    /// Numeric layout option, `None` if absent or unparsable
    pub fn option_f64(&self, key: &str) -> Option<f64> {
        self.option(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Direction named by `elk.direction`
    pub fn direction(&self) -> Option<Direction> {
        self.option(OPTION_DIRECTION).and_then(Direction::from_str)
    }
}

/// Computed placement of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeredPlacement {
    pub id: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl LayeredPlacement {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x: Some(x),
            y: Some(y),
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// What an engine returns; extra fields elkjs adds are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayeredResult {
    #[serde(default)]
    pub children: Vec<LayeredPlacement>,
}

/// An asynchronous layered layout algorithm
///
/// The future need not be `Send`: on wasm32 it wraps a JS promise.
#[async_trait(?Send)]
pub trait LayeredLayoutEngine {
    /// Compute node coordinates for `graph`
    async fn layout(&self, graph: LayeredGraph) -> Result<LayeredResult, LayoutEngineError>;

    /// Origin of the coordinates this engine reports
    fn origin(&self) -> CoordinateOrigin {
        CoordinateOrigin::TopLeft
    }

    /// Engine name for logging
    fn name(&self) -> &'static str;
}

/// Engine that is never available, forcing the fallback layout
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEngine;

#[async_trait(?Send)]
impl LayeredLayoutEngine for UnavailableEngine {
    async fn layout(&self, _graph: LayeredGraph) -> Result<LayeredResult, LayoutEngineError> {
        Err(LayoutEngineError::Unavailable)
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
