//! Fallback layout: breadth-first leveling
//!
//! A self-contained layout that positions every node from the topology
//! alone. It is what the primary adapter falls back to, so it must succeed
//! for any input: cycles, self-loops, duplicate edges, dangling edges and
//! disconnected components all produce a position for every node.
//!
//! Levels run left to right (`x = level * bfs_spacing_x`); nodes sharing a
//! level stack downwards in discovery order (`y = index * bfs_spacing_y`).

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info, span, trace, Level};

use crate::core::{Edge, LayoutConfig, Node, Position};

/// Level assignment for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSlot {
    pub level: usize,
    pub index: usize,
}

/// Compute the level and in-level index of every node
///
/// Returned in the order of `nodes`.
pub fn assign_levels(nodes: &[Node], edges: &[Edge]) -> Vec<LevelSlot> {
    if nodes.is_empty() {
        return Vec::new();
    }

    // First occurrence wins for duplicate ids
    let mut position_of: HashMap<&str, usize> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        position_of.entry(node.id.as_str()).or_insert(i);
    }

    let mut in_degree = vec![0usize; nodes.len()];
    let mut connected = vec![false; nodes.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();

    for edge in edges {
        let (Some(&from), Some(&to)) = (
            position_of.get(edge.source.as_str()),
            position_of.get(edge.target.as_str()),
        ) else {
            trace!(edge_id = %edge.id, "Ignoring edge with unknown endpoint");
            continue;
        };
        in_degree[to] += 1;
        connected[from] = true;
        connected[to] = true;
        if seen_pairs.insert((from, to)) {
            successors[from].push(to);
        }
    }

    let has_edges = connected.iter().any(|&c| c);
    let mut entries: Vec<usize> = (0..nodes.len())
        .filter(|&i| in_degree[i] == 0 && (connected[i] || !has_edges))
        .collect();
    if entries.is_empty() {
        // Pure cycle: start from the first node that takes part in an edge
        let first = (0..nodes.len()).find(|&i| connected[i]).unwrap_or(0);
        trace!(node_id = %nodes[first].id, "No entry point, using first connected node");
        entries.push(first);
    }
    debug!(entry_count = entries.len(), "Selected entry points");

    let mut level: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for &entry in &entries {
        if level[entry].is_none() {
            level[entry] = Some(0);
            queue.push_back(entry);
        }
    }

    let mut max_level = 0;
    while let Some(current) = queue.pop_front() {
        let next = level[current].unwrap_or(0) + 1;
        for &succ in &successors[current] {
            if level[succ].is_none() {
                level[succ] = Some(next);
                max_level = max_level.max(next);
                queue.push_back(succ);
            }
        }
    }

    // One trailing level per orphan, in input order
    let mut orphan_level = max_level;
    for slot in level.iter_mut() {
        if slot.is_none() {
            orphan_level += 1;
            *slot = Some(orphan_level);
        }
    }

    // Index within level follows discovery order; orphans are alone
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    let discovery = discovery_order(&entries, &successors, nodes.len());
    order.sort_by_key(|&i| discovery[i]);

    let mut next_index: HashMap<usize, usize> = HashMap::new();
    let mut slots = vec![LevelSlot { level: 0, index: 0 }; nodes.len()];
    for i in order {
        let lvl = level[i].unwrap_or(0);
        let counter = next_index.entry(lvl).or_insert(0);
        slots[i] = LevelSlot {
            level: lvl,
            index: *counter,
        };
        *counter += 1;
    }

    slots
}

/// Rank of each node in BFS discovery order; undiscovered nodes rank after
/// all discovered ones, in input order
fn discovery_order(entries: &[usize], successors: &[Vec<usize>], len: usize) -> Vec<usize> {
    let mut rank = vec![usize::MAX; len];
    let mut next = 0;
    let mut queue: VecDeque<usize> = VecDeque::new();
    for &entry in entries {
        if rank[entry] == usize::MAX {
            rank[entry] = next;
            next += 1;
            queue.push_back(entry);
        }
    }
    while let Some(current) = queue.pop_front() {
        for &succ in &successors[current] {
            if rank[succ] == usize::MAX {
                rank[succ] = next;
                next += 1;
                queue.push_back(succ);
            }
        }
    }
    for r in rank.iter_mut() {
        if *r == usize::MAX {
            *r = next;
            next += 1;
        }
    }
    rank
}

/// Position every node by BFS leveling
///
/// Never fails: every node in `nodes` receives exactly one position.
pub fn fallback_layout(nodes: &mut [Node], edges: &[Edge], config: &LayoutConfig) {
    let layout_span = span!(
        Level::INFO,
        "fallback_layout",
        node_count = nodes.len(),
        edge_count = edges.len()
    );
    let _enter = layout_span.enter();

    let slots = assign_levels(nodes, edges);
    for (node, slot) in nodes.iter_mut().zip(&slots) {
        node.position = Position::new(
            slot.level as f64 * config.bfs_spacing_x,
            slot.index as f64 * config.bfs_spacing_y,
        );
    }

    let levels = slots.iter().map(|s| s.level + 1).max().unwrap_or(0);
    info!(node_count = nodes.len(), levels, "Fallback layout completed");
}
