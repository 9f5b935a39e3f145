//! Property tests for the engine's totality and placement guarantees

use std::collections::HashSet;

use flowgraph::engine::{
    assign_levels, complete_edges, fallback_layout, is_free, normalize_nodes, GridAllocator,
    LayeredGraph, RadialAllocator,
};
use flowgraph::prelude::*;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const KINDS: [&str; 8] = [
    "start",
    "question_group",
    "decision",
    "action",
    "info",
    "end",
    "branch",
    "unheard-of",
];

/// A node record with any subset of its fields present
fn arb_record() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(0u32..50),
        proptest::option::of(0usize..KINDS.len()),
        proptest::option::of("[a-zA-Zäöü ]{0,12}"),
        proptest::option::of((-2000.0f64..2000.0, -2000.0f64..2000.0)),
        proptest::option::of(proptest::collection::vec("[a-z]{0,5}", 0..3)),
    )
        .prop_map(|(id, kind, label, position, options)| {
            let mut record = Map::new();
            if let Some(id) = id {
                record.insert("id".into(), json!(id));
            }
            if let Some(kind) = kind {
                record.insert("type".into(), json!(KINDS[kind]));
            }
            if let Some(label) = label {
                record.insert("title".into(), json!(label));
            }
            if let Some((x, y)) = position {
                record.insert("position".into(), json!({"x": x, "y": y}));
            }
            if let Some(options) = options {
                record.insert("options".into(), json!(options));
            }
            Value::Object(record)
        })
}

fn chain_nodes(count: usize) -> Vec<Node> {
    (0..count)
        .map(|i| Node::new(format!("n{}", i), NodeKind::Action, format!("Schritt {}", i)))
        .collect()
}

fn edges_from(pairs: &[(usize, usize)], count: usize) -> Vec<Edge> {
    pairs
        .iter()
        .filter(|(s, t)| *s < count && *t < count)
        .enumerate()
        .map(|(i, (s, t))| Edge::new(format!("e{}", i), format!("n{}", s), format!("n{}", t)))
        .collect()
}

fn arb_points() -> impl Strategy<Value = Vec<(f64, f64)>> {
    proptest::collection::vec((-1500.0f64..1500.0, -1500.0f64..1500.0), 0..40)
}

proptest! {
    #[test]
    fn normalize_preserves_count_and_order(
        records in proptest::collection::vec(arb_record(), 0..30),
    ) {
        let config = LayoutConfig::default();
        let parsed: Vec<NodeRecord> = records
            .iter()
            .map(|r| serde_json::from_value(r.clone()).unwrap())
            .collect();
        let nodes = normalize_nodes(parsed, &config);

        prop_assert_eq!(nodes.len(), records.len());
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        prop_assert_eq!(ids.len(), nodes.len());
        for (i, (node, record)) in nodes.iter().zip(&records).enumerate() {
            let base = match record.get("id") {
                Some(id) => id.to_string(),
                None => format!("node-{}", i),
            };
            prop_assert!(
                node.id == base || node.id.starts_with(&format!("{}-", base)),
                "{} does not derive from {}",
                node.id,
                base
            );
            prop_assert!(!node.label.trim().is_empty());
            prop_assert!(node.position.is_finite());
            if node.kind == NodeKind::Decision {
                prop_assert!(!node.options.is_empty());
            }
        }
    }

    #[test]
    fn seed_positions_never_coincide(count in 0usize..60) {
        let config = LayoutConfig::default();
        let records = (0..count).map(|_| NodeRecord::Raw(RawNode::default())).collect();
        let nodes = normalize_nodes(records, &config);
        let distinct: HashSet<(i64, i64)> = nodes
            .iter()
            .map(|n| (n.position.x as i64, n.position.y as i64))
            .collect();
        prop_assert_eq!(distinct.len(), count);
    }

    #[test]
    fn fallback_positions_every_node_once(
        count in 0usize..25,
        pairs in proptest::collection::vec((0usize..25, 0usize..25), 0..60),
    ) {
        let config = LayoutConfig::default();
        let mut nodes = chain_nodes(count);
        let edges = edges_from(&pairs, count);

        let slots = assign_levels(&nodes, &edges);
        prop_assert_eq!(slots.len(), count);
        let distinct: HashSet<(usize, usize)> = slots.iter().map(|s| (s.level, s.index)).collect();
        prop_assert_eq!(distinct.len(), count);

        fallback_layout(&mut nodes, &edges, &config);
        for node in &nodes {
            prop_assert!(node.position.is_finite());
        }
    }

    #[test]
    fn completion_is_idempotent(
        count in 0usize..20,
        pairs in proptest::collection::vec((0usize..20, 0usize..20), 0..30),
    ) {
        let nodes = chain_nodes(count);
        let mut edges = edges_from(&pairs, count);
        complete_edges(&nodes, &mut edges);
        let once = edges.clone();

        prop_assert_eq!(complete_edges(&nodes, &mut edges), 0);
        prop_assert_eq!(&edges, &once);

        let ids: HashSet<&str> = edges.iter().map(|e| e.id.as_str()).collect();
        prop_assert_eq!(ids.len(), edges.len());
    }

    #[test]
    fn radial_allocation_is_always_free(
        points in arb_points(),
        ax in -1500.0f64..1500.0,
        ay in -1500.0f64..1500.0,
    ) {
        let config = LayoutConfig::default();
        let existing: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Node::new(format!("n{}", i), NodeKind::Action, "x").at(*x, *y))
            .collect();
        let anchor = Position::new(ax, ay);
        let placed = RadialAllocator::new(&config).allocate(&existing, anchor);

        prop_assert!(is_free(&existing, placed, config.min_node_distance));
        if existing.is_empty() {
            prop_assert_eq!(placed, anchor);
        }
    }

    #[test]
    fn grid_allocation_is_always_free(
        points in arb_points(),
        ax in -1500.0f64..1500.0,
        ay in -1500.0f64..1500.0,
    ) {
        let config = LayoutConfig::default();
        let existing: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Node::new(format!("n{}", i), NodeKind::Action, "x").at(*x, *y))
            .collect();
        let anchor = Position::new(ax, ay);
        let placed = GridAllocator::new(&config).allocate(&existing, anchor);

        prop_assert!(is_free(&existing, placed, config.min_node_distance));
        if existing.is_empty() {
            prop_assert_eq!(placed, anchor);
        }
    }

    #[test]
    fn builtin_engine_places_every_acyclic_graph(
        count in 1usize..20,
        pairs in proptest::collection::vec((0usize..20, 0usize..20), 0..40),
    ) {
        // forward edges only
        let forward: Vec<(usize, usize)> = pairs.into_iter().filter(|(s, t)| s < t).collect();
        let nodes = chain_nodes(count);
        let edges = edges_from(&forward, count);
        let request = LayeredGraph::from_graph(&nodes, &edges, &LayoutConfig::default());

        let result = SugiyamaEngine::new().compute(&request).unwrap();
        prop_assert_eq!(result.children.len(), count);
        for child in &result.children {
            prop_assert!(child.x.map_or(false, f64::is_finite));
            prop_assert!(child.y.map_or(false, f64::is_finite));
        }
    }
}
