//! Edge completion
//!
//! Fills gaps in otherwise linear step sequences: when two steps that are
//! adjacent in authoring order are completely disconnected, a synthetic
//! `previous -> next` edge is added. Steps that already branch or converge
//! are left alone.

use std::collections::HashSet;

use tracing::{debug, span, trace, Level};

use super::normalize::unique_id;
use crate::core::{Edge, Node};

/// Add the missing edges between consecutive nodes
///
/// For each consecutive pair `(a, b)` in `nodes`, an edge `a -> b` is added
/// unless `a` and `b` share an id, `a` already has an outgoing edge, `b`
/// already has an incoming edge, or `a -> b` already exists. Degrees are tracked as edges are added, so the
/// result is stable: completing it again adds nothing.
///
/// Returns the number of edges added.
pub fn complete_edges(nodes: &[Node], edges: &mut Vec<Edge>) -> usize {
    let completion_span = span!(
        Level::DEBUG,
        "complete_edges",
        node_count = nodes.len(),
        edge_count = edges.len()
    );
    let _enter = completion_span.enter();

    let mut has_outgoing: HashSet<String> = edges.iter().map(|e| e.source.clone()).collect();
    let mut has_incoming: HashSet<String> = edges.iter().map(|e| e.target.clone()).collect();
    let mut pairs: HashSet<(String, String)> = edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    let mut used_ids: HashSet<String> = edges.iter().map(|e| e.id.clone()).collect();

    let mut added = 0;
    for pair in nodes.windows(2) {
        let (from, to) = (&pair[0].id, &pair[1].id);

        if from == to {
            trace!(node_id = %from, "Repeated id, no self-loop");
            continue;
        }
        if has_outgoing.contains(from)
            || has_incoming.contains(to)
            || pairs.contains(&(from.clone(), to.clone()))
        {
            trace!(from = %from, to = %to, "Pair already connected, skipping");
            continue;
        }

        let id = unique_id(Edge::synthetic_id(from, to), &used_ids);
        trace!(edge_id = %id, from = %from, to = %to, "Adding synthetic edge");

        used_ids.insert(id.clone());
        has_outgoing.insert(from.clone());
        has_incoming.insert(to.clone());
        pairs.insert((from.clone(), to.clone()));
        edges.push(Edge::new(id, from.clone(), to.clone()));
        added += 1;
    }

    debug!(added, edge_count = edges.len(), "Edge completion finished");
    added
}
