//! Layout configuration
//!
//! Every spacing, distance and size constant used by the engine lives in
//! [`LayoutConfig`]. The defaults are the values the flow editor has always
//! used; callers override them for other canvas scales.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Direction, FlowGraphError};

/// Editor views that share the engine
///
/// Surfaces differ only in the node size hints passed to the layered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorSurface {
    /// Process flow editor
    #[default]
    Process,
    /// Dialog flow editor, larger cards with question fields
    Dialog,
}

impl EditorSurface {
    /// Node (width, height) hint for this surface
    pub fn node_size(&self) -> (f64, f64) {
        match self {
            EditorSurface::Process => (220.0, 80.0),
            EditorSurface::Dialog => (260.0, 120.0),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "process" => Some(EditorSurface::Process),
            "dialog" => Some(EditorSurface::Dialog),
            _ => None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Minimum Euclidean distance between a placed node and any other node
    pub min_node_distance: f64,
    /// Probe radius `d` of the radial search
    pub radial_step: f64,
    /// Offset applied to the anchor when every probe is taken
    pub far_offset: f64,
    pub grid_cell_width: f64,
    pub grid_cell_height: f64,
    /// Half-size of the bounded grid scan, 2 gives a 5x5 neighbourhood
    pub grid_radius: usize,
    /// Rings searched past the bounded probes before the far offset
    pub max_search_rings: usize,
    pub bfs_spacing_x: f64,
    pub bfs_spacing_y: f64,
    /// Seed grid used by the normalizer for nodes without a position
    pub seed_spacing_x: f64,
    pub seed_spacing_y: f64,
    pub seed_columns: usize,
    /// Node size hints for the layered layout
    pub node_width: f64,
    pub node_height: f64,
    /// Gap between sibling nodes within a layer
    pub node_spacing: f64,
    /// Gap between consecutive layers
    pub layer_spacing: f64,
    pub direction: Direction,
    /// Branches synthesized for decision nodes without options
    pub decision_options: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let (node_width, node_height) = EditorSurface::Process.node_size();
        Self {
            min_node_distance: 150.0,
            radial_step: 200.0,
            far_offset: 400.0,
            grid_cell_width: 250.0,
            grid_cell_height: 150.0,
            grid_radius: 2,
            max_search_rings: 32,
            bfs_spacing_x: 300.0,
            bfs_spacing_y: 150.0,
            seed_spacing_x: 250.0,
            seed_spacing_y: 150.0,
            seed_columns: 4,
            node_width,
            node_height,
            node_spacing: 80.0,
            layer_spacing: 120.0,
            direction: Direction::LeftRight,
            decision_options: vec!["Ja".to_string(), "Nein".to_string()],
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the node size hints of an editor surface
    pub fn for_surface(surface: EditorSurface) -> Self {
        Self::default().with_surface(surface)
    }

    /// Replace the node size hints with those of an editor surface
    pub fn with_surface(mut self, surface: EditorSurface) -> Self {
        let (width, height) = surface.node_size();
        self.node_width = width;
        self.node_height = height;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Parse a (possibly partial) configuration from JSON; missing keys keep
    /// their defaults
    pub fn from_json(input: &str) -> Result<Self, FlowGraphError> {
        let config: LayoutConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowGraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Reject configurations the search strategies cannot work with
    pub fn validate(&self) -> Result<(), FlowGraphError> {
        let positive = [
            ("minNodeDistance", self.min_node_distance),
            ("radialStep", self.radial_step),
            ("farOffset", self.far_offset),
            ("gridCellWidth", self.grid_cell_width),
            ("gridCellHeight", self.grid_cell_height),
            ("nodeWidth", self.node_width),
            ("nodeHeight", self.node_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlowGraphError::config_error(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.seed_columns == 0 {
            return Err(FlowGraphError::config_error(
                "seedColumns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
