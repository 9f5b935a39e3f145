//! WebAssembly bindings for the flow editor
//!
//! Every function exchanges JSON strings. Relayout and edits go through a
//! [`LayoutSession`], which owns one orchestrator for the lifetime of an
//! editor so that relayout results can be checked against later edits. The
//! session takes an optional JS function that returns (a promise of) an ELK
//! layout result, for example `(graph) => elk.layout(graph)`, and uses it as
//! the layered engine.

use std::rc::Rc;

use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::core::{
    EditorSurface, FlowGraphError, Graph, LayoutConfig, LayoutEngineError, NodeRecord, Position,
    RawGraph,
};
use crate::engine::{
    complete_edges, fallback_layout, CoordinateOrigin, LayeredGraph, LayeredLayoutEngine,
    LayeredResult, Orchestrator, PlacementStrategy, SugiyamaEngine,
};

/// Initialize WASM module
///
/// Sets up panic hooks and logging for better error messages in the browser.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

/// Layered engine backed by a JS function, or the built-in engine without one
struct JsLayeredEngine {
    layout_fn: Option<js_sys::Function>,
    origin: CoordinateOrigin,
    builtin: SugiyamaEngine,
}

#[async_trait(?Send)]
impl LayeredLayoutEngine for JsLayeredEngine {
    async fn layout(&self, graph: LayeredGraph) -> Result<LayeredResult, LayoutEngineError> {
        let Some(layout_fn) = &self.layout_fn else {
            return self.builtin.layout(graph).await;
        };

        let request = serde_json::to_string(&graph)
            .map_err(|e| LayoutEngineError::rejected(e.to_string()))?;
        let request = js_sys::JSON::parse(&request).map_err(js_engine_error)?;

        let returned = layout_fn
            .call1(&JsValue::NULL, &request)
            .map_err(js_engine_error)?;
        let resolved = JsFuture::from(js_sys::Promise::resolve(&returned))
            .await
            .map_err(js_engine_error)?;

        let text: String = js_sys::JSON::stringify(&resolved)
            .map_err(js_engine_error)?
            .into();
        serde_json::from_str(&text).map_err(|e| LayoutEngineError::malformed(e.to_string()))
    }

    fn origin(&self) -> CoordinateOrigin {
        match self.layout_fn {
            Some(_) => self.origin,
            None => self.builtin.origin(),
        }
    }

    fn name(&self) -> &'static str {
        match self.layout_fn {
            Some(_) => "js",
            None => self.builtin.name(),
        }
    }
}

fn js_engine_error(value: JsValue) -> LayoutEngineError {
    LayoutEngineError::rejected(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

fn to_js_error(err: FlowGraphError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn config_for(surface: &str) -> Result<LayoutConfig, JsValue> {
    EditorSurface::from_str(surface)
        .map(LayoutConfig::for_surface)
        .ok_or_else(|| {
            JsValue::from_str(&format!(
                "Unknown surface: {}. Use 'process' or 'dialog'",
                surface
            ))
        })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| to_js_error(e.into()))
}

fn parse_strategy(strategy: &str) -> Result<PlacementStrategy, JsValue> {
    PlacementStrategy::from_str(strategy).ok_or_else(|| {
        JsValue::from_str(&format!("Unknown strategy: {}. Use 'radial' or 'grid'", strategy))
    })
}

/// One editor's layout state
///
/// Relayouts, placements and removals share a generation counter. A relayout
/// result whose `generation` is no longer current was computed for a graph
/// the editor has changed since, and should be discarded.
#[wasm_bindgen]
pub struct LayoutSession {
    orchestrator: Rc<Orchestrator<JsLayeredEngine>>,
}

#[wasm_bindgen]
impl LayoutSession {
    /// # Arguments
    /// * `surface` - "process" or "dialog"
    /// * `layout_fn` - called with an ELK graph, returns the laid-out graph or a promise of it;
    ///   omit to use the built-in layered engine
    /// * `center_origin` - true if `layout_fn` reports node centres instead of top-left corners
    #[wasm_bindgen(constructor)]
    pub fn new(
        surface: &str,
        layout_fn: Option<js_sys::Function>,
        center_origin: bool,
    ) -> Result<LayoutSession, JsValue> {
        let engine = JsLayeredEngine {
            layout_fn,
            origin: if center_origin {
                CoordinateOrigin::Center
            } else {
                CoordinateOrigin::TopLeft
            },
            builtin: SugiyamaEngine::new(),
        };
        Ok(Self {
            orchestrator: Rc::new(Orchestrator::new(engine, config_for(surface)?)),
        })
    }

    /// Full relayout of `{nodes, edges}` in any supported node shape
    ///
    /// Resolves to JSON `{nodes, edges, usedFallback, generation}`; never
    /// rejects because of the engine.
    pub fn relayout(&self, graph_json: String) -> js_sys::Promise {
        let orchestrator = Rc::clone(&self.orchestrator);
        future_to_promise(async move {
            let graph = RawGraph::from_json(&graph_json).map_err(to_js_error)?;
            let outcome = orchestrator.full_relayout(graph).await;
            to_json(&outcome).map(JsValue::from)
        })
    }

    /// Record an edit made by the editor itself; returns the new generation
    pub fn invalidate(&self) -> f64 {
        self.orchestrator.invalidate() as f64
    }

    pub fn generation(&self) -> f64 {
        self.orchestrator.generation() as f64
    }

    /// True if nothing happened since the relayout tagged `generation` started
    pub fn is_current(&self, generation: f64) -> bool {
        generation >= 0.0 && self.orchestrator.is_generation_current(generation as u64)
    }

    /// Place one new node without moving any existing node
    ///
    /// # Arguments
    /// * `graph_json` - the current canonical graph
    /// * `node_json` - the new node, in any supported shape
    /// * `anchor_x`, `anchor_y` - preferred position; omit either to let the engine suggest one
    /// * `strategy` - "radial" or "grid"
    pub fn place_node(
        &self,
        graph_json: &str,
        node_json: &str,
        anchor_x: Option<f64>,
        anchor_y: Option<f64>,
        strategy: &str,
    ) -> Result<String, JsValue> {
        let strategy = parse_strategy(strategy)?;
        let graph: Graph = serde_json::from_str(graph_json).map_err(|e| to_js_error(e.into()))?;
        let record: NodeRecord =
            serde_json::from_str(node_json).map_err(|e| to_js_error(e.into()))?;

        let anchor = anchor_x.zip(anchor_y).map(|(x, y)| Position::new(x, y));
        to_json(&self.orchestrator.place_node(&graph, record, anchor, strategy))
    }

    /// Remove a node and its edges; the start node is refused
    pub fn remove_node(&self, graph_json: &str, node_id: &str) -> Result<String, JsValue> {
        let graph: Graph = serde_json::from_str(graph_json).map_err(|e| to_js_error(e.into()))?;
        let graph = self
            .orchestrator
            .remove_node(&graph, node_id)
            .map_err(to_js_error)?;
        to_json(&graph)
    }
}

/// Normalize nodes and edges and drop dangling edges, without layout
#[wasm_bindgen]
pub fn normalize_graph(graph_json: &str, surface: &str) -> Result<String, JsValue> {
    let graph = RawGraph::from_json(graph_json).map_err(to_js_error)?;
    let orchestrator = Orchestrator::with_builtin_engine(config_for(surface)?);
    to_json(&orchestrator.normalize(graph))
}

/// Add the missing transitions between consecutive steps
#[wasm_bindgen]
pub fn complete_graph(graph_json: &str) -> Result<String, JsValue> {
    let mut graph: Graph = serde_json::from_str(graph_json).map_err(|e| to_js_error(e.into()))?;
    complete_edges(&graph.nodes, &mut graph.edges);
    to_json(&graph)
}

/// Position a canonical graph with the BFS fallback layout only
#[wasm_bindgen]
pub fn fallback_graph(graph_json: &str, surface: &str) -> Result<String, JsValue> {
    let config = config_for(surface)?;
    let mut graph: Graph = serde_json::from_str(graph_json).map_err(|e| to_js_error(e.into()))?;
    fallback_layout(&mut graph.nodes, &graph.edges, &config);
    to_json(&graph)
}

/// Default configuration for a surface as JSON
#[wasm_bindgen]
pub fn default_config(surface: &str) -> Result<String, JsValue> {
    to_json(&config_for(surface)?)
}
