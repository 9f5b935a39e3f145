//! Layout engine components
//!
//! Leaf-first: normalization, position allocation, edge completion, the
//! fallback layout, the layered layout seam, the primary layout adapter and
//! the orchestrator that sequences them.

pub mod completion;
pub mod fallback;
pub mod layered;
pub mod normalize;
pub mod orchestrator;
pub mod placement;
pub mod primary;

pub use completion::complete_edges;
pub use fallback::{assign_levels, fallback_layout, LevelSlot};
pub use layered::{
    CoordinateOrigin, LayeredEdge, LayeredGraph, LayeredLayoutEngine, LayeredNode,
    LayeredPlacement, LayeredResult, SugiyamaEngine, UnavailableEngine,
};
pub use normalize::{
    normalize_edges, normalize_node, normalize_nodes, retain_connected_edges, seed_position,
};
pub use orchestrator::Orchestrator;
pub use placement::{
    is_free, GridAllocator, PlacementStrategy, PositionAllocator, RadialAllocator,
};
pub use primary::{primary_layout, LayoutOutcome};
