//! Position allocation for interactively added nodes
//!
//! Two interchangeable strategies find a free spot near a desired anchor:
//!
//! - [`RadialAllocator`] tests the anchor, then a fixed ordered list of
//!   offsets at radius `d` and `2d` around it.
//! - [`GridAllocator`] snaps to a rectangular grid and scans a bounded
//!   square neighbourhood of cells from the anchor's cell outward.
//!
//! When the bounded search is exhausted both keep expanding ring by ring up
//! to `max_search_rings`, then try the far offset `anchor + (far, far)`, and
//! finally escape past the bounding box of all nodes. A point whose x lies at
//! least `min_node_distance` right of every node cannot be within that
//! distance of any of them, so the last step always yields a free point.

use serde::{Deserialize, Serialize};
use tracing::{debug, span, trace, Level};

use crate::core::{LayoutConfig, Node, Position};

/// Which allocator to use for a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    #[default]
    Radial,
    Grid,
}

impl PlacementStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "radial" | "spiral" => Some(PlacementStrategy::Radial),
            "grid" => Some(PlacementStrategy::Grid),
            _ => None,
        }
    }

    /// Allocate with this strategy
    pub fn allocate(&self, existing: &[Node], anchor: Position, config: &LayoutConfig) -> Position {
        match self {
            PlacementStrategy::Radial => RadialAllocator::new(config).allocate(existing, anchor),
            PlacementStrategy::Grid => GridAllocator::new(config).allocate(existing, anchor),
        }
    }
}

/// Finds a free position for a new node near an anchor point
pub trait PositionAllocator {
    /// Return a point no closer than the configured minimum distance to any
    /// node in `existing`. An empty `existing` returns `anchor` unchanged.
    fn allocate(&self, existing: &[Node], anchor: Position) -> Position;
}

/// True if `point` keeps `min_distance` from every node
pub fn is_free(existing: &[Node], point: Position, min_distance: f64) -> bool {
    existing
        .iter()
        .all(|n| n.position.distance_to(&point) >= min_distance)
}

/// Fixed probe order of the radial search, in units of the probe radius:
/// axis neighbours, diagonals, then both again at twice the radius
pub const RADIAL_PROBES: [(f64, f64); 16] = [
    (1.0, 0.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (0.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
    (1.0, -1.0),
    (2.0, 0.0),
    (0.0, 2.0),
    (-2.0, 0.0),
    (0.0, -2.0),
    (2.0, 2.0),
    (-2.0, 2.0),
    (-2.0, -2.0),
    (2.0, -2.0),
];

/// Last resort shared by both strategies
fn far_fallback(existing: &[Node], anchor: Position, config: &LayoutConfig) -> Position {
    let far = anchor.offset(config.far_offset, config.far_offset);
    if is_free(existing, far, config.min_node_distance) {
        debug!(position = %far, "Search exhausted, using far offset");
        return far;
    }

    let max_x = existing
        .iter()
        .map(|n| n.position.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let escape = Position::new(
        max_x + config.far_offset.max(config.min_node_distance),
        anchor.y,
    );
    debug!(position = %escape, "Far offset occupied, escaping bounding box");
    escape
}

/// Radial search around the anchor
#[derive(Debug, Clone)]
pub struct RadialAllocator<'a> {
    config: &'a LayoutConfig,
}

impl<'a> RadialAllocator<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Offsets (in pixels) probed before the far fallback, in order
    pub fn probe_offsets(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let d = self.config.radial_step;
        let fixed = RADIAL_PROBES.iter().map(move |&(dx, dy)| (dx * d, dy * d));
        let expanding = (3..=self.config.max_search_rings.max(2)).flat_map(move |ring| {
            let r = ring as f64 * d;
            [
                (r, 0.0),
                (0.0, r),
                (-r, 0.0),
                (0.0, -r),
                (r, r),
                (-r, r),
                (-r, -r),
                (r, -r),
            ]
        });
        fixed.chain(expanding)
    }
}

impl PositionAllocator for RadialAllocator<'_> {
    fn allocate(&self, existing: &[Node], anchor: Position) -> Position {
        let alloc_span = span!(
            Level::DEBUG,
            "radial_allocate",
            existing = existing.len(),
            anchor = %anchor
        );
        let _enter = alloc_span.enter();

        if existing.is_empty() {
            return anchor;
        }

        let min = self.config.min_node_distance;
        if is_free(existing, anchor, min) {
            trace!("Anchor is free");
            return anchor;
        }

        for (probe, (dx, dy)) in self.probe_offsets().enumerate() {
            let candidate = anchor.offset(dx, dy);
            if is_free(existing, candidate, min) {
                trace!(probe, position = %candidate, "Found free probe");
                return candidate;
            }
        }

        far_fallback(existing, anchor, self.config)
    }
}

/// Grid search around the anchor's cell
#[derive(Debug, Clone)]
pub struct GridAllocator<'a> {
    config: &'a LayoutConfig,
}

impl<'a> GridAllocator<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Cell containing `point`
    pub fn cell_of(&self, point: Position) -> (i64, i64) {
        (
            (point.x / self.config.grid_cell_width).round() as i64,
            (point.y / self.config.grid_cell_height).round() as i64,
        )
    }

    /// Top-left corner of a cell
    pub fn cell_origin(&self, cell: (i64, i64)) -> Position {
        Position::new(
            cell.0 as f64 * self.config.grid_cell_width,
            cell.1 as f64 * self.config.grid_cell_height,
        )
    }

    /// Cell offsets of one ring: row-major over the ring's border.
    /// Ring 0 is the anchor cell itself.
    pub fn ring(radius: i64) -> Vec<(i64, i64)> {
        if radius == 0 {
            return vec![(0, 0)];
        }
        let mut cells = Vec::with_capacity((8 * radius) as usize);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() == radius || dy.abs() == radius {
                    cells.push((dx, dy));
                }
            }
        }
        cells
    }

    /// A cell-sized box at `point` overlaps no node's box and keeps the
    /// minimum distance
    fn cell_is_free(&self, existing: &[Node], point: Position) -> bool {
        let (w, h) = (self.config.grid_cell_width, self.config.grid_cell_height);
        existing.iter().all(|n| {
            let overlaps = (n.position.x - point.x).abs() < w && (n.position.y - point.y).abs() < h;
            !overlaps
        }) && is_free(existing, point, self.config.min_node_distance)
    }
}

impl PositionAllocator for GridAllocator<'_> {
    fn allocate(&self, existing: &[Node], anchor: Position) -> Position {
        let alloc_span = span!(
            Level::DEBUG,
            "grid_allocate",
            existing = existing.len(),
            anchor = %anchor
        );
        let _enter = alloc_span.enter();

        if existing.is_empty() {
            return anchor;
        }

        let home = self.cell_of(anchor);
        let bounded = self.config.grid_radius as i64;
        let rings = bounded.max(self.config.max_search_rings as i64);

        for radius in 0..=rings {
            if radius == bounded + 1 {
                debug!(bounded, "Bounded grid scan exhausted, expanding");
            }
            for (dx, dy) in Self::ring(radius) {
                let candidate = self.cell_origin((home.0 + dx, home.1 + dy));
                if self.cell_is_free(existing, candidate) {
                    trace!(radius, position = %candidate, "Found free cell");
                    return candidate;
                }
            }
        }

        // Keep the result on the grid: round the escape point up to a cell
        let fallback = far_fallback(existing, anchor, self.config);
        let snapped = Position::new(
            (fallback.x / self.config.grid_cell_width).ceil() * self.config.grid_cell_width,
            (fallback.y / self.config.grid_cell_height).round() * self.config.grid_cell_height,
        );
        if self.cell_is_free(existing, snapped) {
            snapped
        } else {
            fallback
        }
    }
}
