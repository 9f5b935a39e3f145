//! Canonical node normalizer
//!
//! Converts node records of any shape into canonical [`Node`]s. The
//! conversion is total: it never drops, creates or reorders nodes, and every
//! output node has an id, a kind, a label, option and field lists and a
//! position.

use std::collections::HashSet;

use tracing::{debug, span, trace, Level};

use crate::core::{
    coerce_id, Edge, LayoutConfig, Node, NodeKind, NodeRecord, Position, RawEdge, RawNode,
};

/// Normalize a sequence of node records
///
/// The output has the same length and order as the input. Ids are unique:
/// a node whose id was already taken by an earlier one gets a `-<n>` suffix.
pub fn normalize_nodes(records: Vec<NodeRecord>, config: &LayoutConfig) -> Vec<Node> {
    let normalize_span = span!(Level::DEBUG, "normalize_nodes", record_count = records.len());
    let _enter = normalize_span.enter();

    let mut used_ids: HashSet<String> = HashSet::with_capacity(records.len());
    let mut nodes = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let mut node = normalize_node(record, index, config);
        if used_ids.contains(&node.id) {
            let id = unique_id(node.id.clone(), &used_ids);
            debug!(duplicate = %node.id, renamed = %id, "Renaming duplicate node id");
            node.id = id;
        }
        used_ids.insert(node.id.clone());
        nodes.push(node);
    }

    debug!(node_count = nodes.len(), "Normalized nodes");
    nodes
}

/// Normalize one record that sits at `index` in its sequence
///
/// `index` drives the fallback id (`node-<index>`), the generic label
/// (`Node <index+1>`) and the seed grid position.
pub fn normalize_node(record: NodeRecord, index: usize, config: &LayoutConfig) -> Node {
    let mut node = match record {
        NodeRecord::Canonical(node) => node,
        NodeRecord::Raw(raw) => from_raw(raw, index, config),
    };

    if node.id.trim().is_empty() {
        node.id = format!("node-{}", index);
    }
    if node.label.trim().is_empty() {
        node.label = format!("Node {}", index + 1);
    }
    if node.kind.is_decision() && node.options.is_empty() {
        trace!(node_id = %node.id, "Synthesizing default decision options");
        node.options = config.decision_options.clone();
    }
    if !node.position.is_finite() {
        node.position = seed_position(index, config);
    }

    node
}

fn from_raw(mut raw: RawNode, index: usize, config: &LayoutConfig) -> Node {
    let id = raw.id().unwrap_or_else(|| format!("node-{}", index));
    let kind = raw
        .kind_name()
        .and_then(NodeKind::parse)
        .unwrap_or_default();
    let label = raw
        .label_text()
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| format!("Node {}", index + 1));
    let description = raw
        .description_text()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string());
    let options = raw
        .take_options()
        .unwrap_or_default()
        .into_iter()
        .filter(|o| !o.trim().is_empty())
        .collect();
    let fields = raw
        .take_fields()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, f)| f.into_field(i))
        .collect();
    let position = raw
        .position
        .filter(Position::is_finite)
        .unwrap_or_else(|| seed_position(index, config));

    Node {
        id,
        kind,
        label,
        description,
        fields,
        options,
        position,
    }
}

/// Deterministic position for the node at `index` on the seed grid
///
/// Fills rows of `seed_columns` cells, so no two indices share coordinates.
pub fn seed_position(index: usize, config: &LayoutConfig) -> Position {
    let columns = config.seed_columns.max(1);
    Position::new(
        (index % columns) as f64 * config.seed_spacing_x,
        (index / columns) as f64 * config.seed_spacing_y,
    )
}

/// Normalize raw edges into canonical edges
///
/// Ids are coerced to strings; a missing id becomes `edge-<source>-<target>`
/// and colliding ids get a `-<n>` suffix. Edges without both endpoints are
/// dropped. Endpoints are not checked against any node set here, see
/// [`retain_connected_edges`].
pub fn normalize_edges(records: Vec<RawEdge>) -> Vec<Edge> {
    let mut used_ids: HashSet<String> = HashSet::new();
    let mut edges = Vec::with_capacity(records.len());

    for record in records {
        let (Some(source), Some(target)) = (
            record.source.as_ref().and_then(coerce_id),
            record.target.as_ref().and_then(coerce_id),
        ) else {
            trace!("Dropping edge without both endpoints");
            continue;
        };

        let base_id = record
            .id
            .as_ref()
            .and_then(coerce_id)
            .unwrap_or_else(|| Edge::synthetic_id(&source, &target));
        let id = unique_id(base_id, &used_ids);
        used_ids.insert(id.clone());

        let label = record
            .label
            .filter(|l| !l.trim().is_empty())
            .or(record.source_handle.filter(|h| !h.trim().is_empty()));

        edges.push(Edge {
            id,
            source,
            target,
            label,
        });
    }

    debug!(edge_count = edges.len(), "Normalized edges");
    edges
}

/// Drop edges whose source or target is not among `nodes`
pub fn retain_connected_edges(nodes: &[Node], edges: Vec<Edge>) -> Vec<Edge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let before = edges.len();
    let kept: Vec<Edge> = edges
        .into_iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .collect();

    if kept.len() < before {
        debug!(dropped = before - kept.len(), "Dropped dangling edges");
    }
    kept
}

/// `base` if unused, otherwise the first free `base-<n>`
pub(crate) fn unique_id(base: String, used: &HashSet<String>) -> String {
    if !used.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}
