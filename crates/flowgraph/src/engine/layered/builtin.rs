//! Native layered layout
//!
//! A Sugiyama-style engine for hosts without elkjs: longest-path layering,
//! barycenter crossing reduction and centred coordinate assignment. Unlike
//! the fallback layout it is strict and rejects cyclic input, which lets the
//! adapter's recovery path be exercised natively.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tracing::{debug, span, trace, Level};

use super::{
    CoordinateOrigin, LayeredGraph, LayeredLayoutEngine, LayeredPlacement, LayeredResult,
    OPTION_LAYER_SPACING, OPTION_NODE_SPACING,
};
use crate::core::{Direction, LayoutEngineError};

const DEFAULT_NODE_SPACING: f64 = 80.0;
const DEFAULT_LAYER_SPACING: f64 = 120.0;

/// Built-in layered layout engine
#[derive(Debug, Clone)]
pub struct SugiyamaEngine {
    /// Number of barycenter sweeps
    ordering_sweeps: usize,
}

impl Default for SugiyamaEngine {
    fn default() -> Self {
        Self { ordering_sweeps: 4 }
    }
}

impl SugiyamaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ordering_sweeps(mut self, sweeps: usize) -> Self {
        self.ordering_sweeps = sweeps;
        self
    }

    /// Synchronous layout, reporting node centres
    pub fn compute(&self, graph: &LayeredGraph) -> Result<LayeredResult, LayoutEngineError> {
        let layout_span = span!(
            Level::INFO,
            "sugiyama_layout",
            node_count = graph.children.len(),
            edge_count = graph.edges.len()
        );
        let _enter = layout_span.enter();

        if graph.children.is_empty() {
            return Ok(LayeredResult::default());
        }

        let adjacency = Adjacency::build(graph)?;
        let layer_of = assign_layers(graph, &adjacency)?;

        let layer_count = layer_of.iter().copied().max().unwrap_or(0) + 1;
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
        for (node, &layer) in layer_of.iter().enumerate() {
            layers[layer].push(node);
        }
        debug!(layer_count, "Assigned nodes to layers");

        let crossings = adjacency.minimize_crossings(&mut layers, self.ordering_sweeps);
        debug!(crossings, "Ordered layers");

        let direction = graph.direction().unwrap_or_default();
        let node_spacing = graph
            .option_f64(OPTION_NODE_SPACING)
            .unwrap_or(DEFAULT_NODE_SPACING);
        let layer_spacing = graph
            .option_f64(OPTION_LAYER_SPACING)
            .unwrap_or(DEFAULT_LAYER_SPACING);

        let children = assign_coordinates(graph, &layers, direction, node_spacing, layer_spacing);
        Ok(LayeredResult { children })
    }
}

#[async_trait(?Send)]
impl LayeredLayoutEngine for SugiyamaEngine {
    async fn layout(&self, graph: LayeredGraph) -> Result<LayeredResult, LayoutEngineError> {
        self.compute(&graph)
    }

    fn origin(&self) -> CoordinateOrigin {
        CoordinateOrigin::Center
    }

    fn name(&self) -> &'static str {
        "sugiyama"
    }
}

/// Deduplicated successor and predecessor lists by child index
struct Adjacency {
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl Adjacency {
    fn build(graph: &LayeredGraph) -> Result<Self, LayoutEngineError> {
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        for (i, child) in graph.children.iter().enumerate() {
            if index_of.insert(child.id.as_str(), i).is_some() {
                return Err(LayoutEngineError::rejected(format!(
                    "duplicate node id '{}'",
                    child.id
                )));
            }
        }

        let len = graph.children.len();
        let mut successors = vec![Vec::new(); len];
        let mut predecessors = vec![Vec::new(); len];

        for edge in &graph.edges {
            if edge.sources.is_empty() || edge.targets.is_empty() {
                return Err(LayoutEngineError::rejected(format!(
                    "edge '{}' has no endpoints",
                    edge.id
                )));
            }
            for source in &edge.sources {
                for target in &edge.targets {
                    let from = lookup(&index_of, &edge.id, source)?;
                    let to = lookup(&index_of, &edge.id, target)?;
                    if from == to {
                        return Err(LayoutEngineError::CyclicGraph {
                            node: source.clone(),
                        });
                    }
                    if !successors[from].contains(&to) {
                        successors[from].push(to);
                        predecessors[to].push(from);
                    }
                }
            }
        }

        Ok(Self {
            successors,
            predecessors,
        })
    }
}

fn lookup(
    index_of: &HashMap<&str, usize>,
    edge: &str,
    node: &str,
) -> Result<usize, LayoutEngineError> {
    index_of
        .get(node)
        .copied()
        .ok_or_else(|| LayoutEngineError::UnknownEndpoint {
            edge: edge.to_string(),
            node: node.to_string(),
        })
}

/// Longest-path layering over a topological order (Kahn, input order)
fn assign_layers(
    graph: &LayeredGraph,
    adjacency: &Adjacency,
) -> Result<Vec<usize>, LayoutEngineError> {
    let len = graph.children.len();
    let mut in_degree: Vec<usize> = adjacency.predecessors.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = (0..len).filter(|&i| in_degree[i] == 0).collect();
    let mut layer = vec![0usize; len];
    let mut processed = 0;

    while let Some(node) = queue.pop_front() {
        processed += 1;
        for &succ in &adjacency.successors[node] {
            layer[succ] = layer[succ].max(layer[node] + 1);
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    if processed < len {
        let stuck = (0..len).find(|&i| in_degree[i] > 0).unwrap_or(0);
        trace!(node_id = %graph.children[stuck].id, "Cycle detected");
        return Err(LayoutEngineError::CyclicGraph {
            node: graph.children[stuck].id.clone(),
        });
    }

    Ok(layer)
}

/// Which neighbours drive a reordering pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Predecessors in the layer above
    Down,
    /// Successors in the layer below
    Up,
}

impl Adjacency {
    fn neighbours(&self, node: usize, sweep: Sweep) -> &[usize] {
        match sweep {
            Sweep::Down => &self.predecessors[node],
            Sweep::Up => &self.successors[node],
        }
    }

    /// Layer and slot of every node
    fn slots(&self, layers: &[Vec<usize>]) -> Vec<(usize, usize)> {
        let mut slots = vec![(usize::MAX, 0); self.successors.len()];
        for (layer, nodes) in layers.iter().enumerate() {
            for (slot, &node) in nodes.iter().enumerate() {
                slots[node] = (layer, slot);
            }
        }
        slots
    }

    /// Number of pairwise edge crossings between neighbouring layers
    ///
    /// Only edges spanning exactly one layer are counted.
    fn crossings(&self, layers: &[Vec<usize>]) -> usize {
        let slots = &self.slots(layers);
        let mut total = 0;

        for (layer, nodes) in layers.iter().enumerate() {
            // (upper slot, lower slot), ordered by upper then lower slot
            let mut spans: Vec<(usize, usize)> = nodes
                .iter()
                .flat_map(|&node| {
                    let upper = slots[node].1;
                    self.successors[node]
                        .iter()
                        .map(move |&succ| (upper, slots[succ]))
                })
                .filter(|&(_, (succ_layer, _))| succ_layer == layer + 1)
                .map(|(upper, (_, lower))| (upper, lower))
                .collect();
            spans.sort_unstable();

            // a later span with a smaller lower slot starts further right, so it crosses
            total += spans
                .iter()
                .enumerate()
                .map(|(i, &(_, lower))| {
                    spans[i + 1..]
                        .iter()
                        .filter(|&&(_, other)| other < lower)
                        .count()
                })
                .sum::<usize>();
        }
        total
    }

    /// Reorder `layers[index]` by the mean slot of its neighbours in the
    /// adjacent layer. Nodes without such neighbours keep their relative
    /// order behind the others.
    fn reorder(&self, layers: &mut [Vec<usize>], index: usize, sweep: Sweep) {
        let reference = match sweep {
            Sweep::Down => index - 1,
            Sweep::Up => index + 1,
        };
        let slots = self.slots(layers);

        let mut keyed: Vec<(Option<f64>, usize)> = layers[index]
            .iter()
            .map(|&node| {
                let (sum, count) = self
                    .neighbours(node, sweep)
                    .iter()
                    .map(|&n| slots[n])
                    .filter(|&(layer, _)| layer == reference)
                    .fold((0.0, 0usize), |(sum, count), (_, slot)| {
                        (sum + slot as f64, count + 1)
                    });
                ((count > 0).then(|| sum / count as f64), node)
            })
            .collect();

        // stable, so ties and unconnected nodes keep their order
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.total_cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        layers[index] = keyed.into_iter().map(|(_, node)| node).collect();
    }

    /// Alternating down and up passes; keeps the best ordering seen and
    /// returns its crossing count
    fn minimize_crossings(&self, layers: &mut Vec<Vec<usize>>, passes: usize) -> usize {
        let mut fewest = self.crossings(layers);
        if layers.len() < 2 || fewest == 0 {
            return fewest;
        }
        let mut best = layers.clone();

        for pass in 0..passes {
            let sweep = if pass % 2 == 0 { Sweep::Down } else { Sweep::Up };
            let order: Vec<usize> = match sweep {
                Sweep::Down => (1..layers.len()).collect(),
                Sweep::Up => (0..layers.len() - 1).rev().collect(),
            };
            for index in order {
                self.reorder(layers, index, sweep);
            }

            let crossings = self.crossings(layers);
            trace!(pass, crossings, "Ordering pass");
            if crossings < fewest {
                fewest = crossings;
                best.clone_from(layers);
            }
            if fewest == 0 {
                break;
            }
        }

        *layers = best;
        fewest
    }
}

/// Centre coordinates for every child, in request order
///
/// Layers advance along the flow axis; nodes of one layer are stacked across
/// it and centred on a common line. The bounding box starts at the origin.
fn assign_coordinates(
    graph: &LayeredGraph,
    layers: &[Vec<usize>],
    direction: Direction,
    node_spacing: f64,
    layer_spacing: f64,
) -> Vec<LayeredPlacement> {
    let position_span = span!(Level::DEBUG, "assign_coordinates", direction = %direction);
    let _enter = position_span.enter();

    let vertical = direction.is_vertical();
    // (extent along the flow, extent across it)
    let extent = |i: usize| {
        let child = &graph.children[i];
        if vertical {
            (child.height, child.width)
        } else {
            (child.width, child.height)
        }
    };

    let thickness: Vec<f64> = layers
        .iter()
        .map(|layer| layer.iter().map(|&i| extent(i).0).fold(0.0, f64::max))
        .collect();
    let breadth: Vec<f64> = layers
        .iter()
        .map(|layer| {
            layer.iter().map(|&i| extent(i).1).sum::<f64>()
                + layer.len().saturating_sub(1) as f64 * node_spacing
        })
        .collect();
    let total_breadth = breadth.iter().copied().fold(0.0, f64::max);
    let total_length = thickness.iter().sum::<f64>()
        + thickness.len().saturating_sub(1) as f64 * layer_spacing;

    let mut centres = vec![(0.0, 0.0); graph.children.len()];
    let mut along = 0.0;
    for (layer_idx, layer) in layers.iter().enumerate() {
        let mut main = along + thickness[layer_idx] / 2.0;
        if direction.is_reversed() {
            main = total_length - main;
        }
        let mut across = (total_breadth - breadth[layer_idx]) / 2.0;
        for &node in layer {
            let size = extent(node).1;
            centres[node] = (main, across + size / 2.0);
            across += size + node_spacing;
        }
        along += thickness[layer_idx] + layer_spacing;
    }

    debug!(total_length, total_breadth, "Assigned coordinates");

    graph
        .children
        .iter()
        .zip(centres)
        .map(|(child, (main, across))| {
            let (x, y) = if vertical { (across, main) } else { (main, across) };
            LayeredPlacement::new(child.id.clone(), x, y).with_size(child.width, child.height)
        })
        .collect()
}
