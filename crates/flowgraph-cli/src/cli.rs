//! Command-line interface for the flowgraph utility
//!
//! Lays out, completes and extends flow graphs stored as JSON. Every command
//! reads a `{nodes, edges}` document from a file or stdin and writes JSON to
//! a file or stdout, so fixtures can be produced and inspected by hand.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;

use flowgraph::core::logging::init_logging;
use flowgraph::engine::{
    LayeredLayoutEngine, Orchestrator, PlacementStrategy, SugiyamaEngine, UnavailableEngine,
};
use flowgraph::{
    complete_graph, parse_graph, Direction, EditorSurface, LayoutConfig, LayoutOutcome,
    NodeRecord, Position, RawGraph,
};

/// Flowgraph - Layout engine for process and dialog flows
#[derive(Parser)]
#[command(name = "flowgraph")]
#[command(about = "Lay out, complete and extend process and dialog flow graphs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Options shared by every command that needs a layout configuration
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct ConfigArgs {
    /// Editor surface whose node size hints apply
    #[arg(long, value_enum, default_value_t = SurfaceChoice::Process)]
    pub surface: SurfaceChoice,

    /// JSON file overriding configuration constants
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Layout direction (TD|LR|RL|BT)
    #[arg(long)]
    pub direction: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full relayout: normalize, lay out and complete a graph
    Layout {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the layout result (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Layered engine to try before the BFS fallback
        #[arg(long, value_enum, default_value_t = EngineChoice::Builtin)]
        engine: EngineChoice,

        #[command(flatten)]
        options: ConfigArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Place one new node without moving the existing ones
    Place {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the extended graph (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Node record as JSON, in any accepted shape
        #[arg(short, long, default_value = "{}")]
        node: String,

        /// Anchor x coordinate (defaults below the last node)
        #[arg(long, requires = "y", allow_negative_numbers = true)]
        x: Option<f64>,

        /// Anchor y coordinate
        #[arg(long, requires = "x", allow_negative_numbers = true)]
        y: Option<f64>,

        /// Free-position search strategy
        #[arg(long, value_enum, default_value_t = StrategyChoice::Radial)]
        strategy: StrategyChoice,

        #[command(flatten)]
        options: ConfigArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Normalize a graph and add the missing sequential edges
    Complete {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the completed graph (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: ConfigArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration
    Defaults {
        #[command(flatten)]
        options: ConfigArgs,
    },
}

/// Editor surfaces
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum SurfaceChoice {
    #[default]
    Process,
    Dialog,
}

impl From<SurfaceChoice> for EditorSurface {
    fn from(value: SurfaceChoice) -> Self {
        match value {
            SurfaceChoice::Process => EditorSurface::Process,
            SurfaceChoice::Dialog => EditorSurface::Dialog,
        }
    }
}

/// Layered engines available outside the browser
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum EngineChoice {
    /// Built-in Sugiyama-style layered layout
    #[default]
    Builtin,
    /// No layered engine: always use the BFS fallback
    None,
}

/// Free-position search strategies
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum StrategyChoice {
    /// Radial probes around the anchor
    #[default]
    Radial,
    /// Snap to a grid and scan the surrounding cells
    Grid,
}

impl From<StrategyChoice> for PlacementStrategy {
    fn from(value: StrategyChoice) -> Self {
        match value {
            StrategyChoice::Radial => PlacementStrategy::Radial,
            StrategyChoice::Grid => PlacementStrategy::Grid,
        }
    }
}

/// Main CLI application
pub struct FlowgraphApp {
    verbose: bool,
}

impl FlowgraphApp {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over the flags
        let log_level_str = std::env::var("FLOWGRAPH_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var("FLOWGRAPH_LOG_FORMAT")
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        self.verbose = cli.verbose;
        if self.verbose {
            eprintln!("Flowgraph v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Layout {
                input,
                output,
                engine,
                options,
                pretty,
            } => self.layout_command(input, output, engine, &options, pretty),
            Commands::Place {
                input,
                output,
                node,
                x,
                y,
                strategy,
                options,
                pretty,
            } => {
                let anchor = x.zip(y).map(|(x, y)| Position::new(x, y));
                self.place_command(input, output, &node, anchor, strategy, &options, pretty)
            }
            Commands::Complete {
                input,
                output,
                options,
                pretty,
            } => self.complete_command(input, output, &options, pretty),
            Commands::Defaults { options } => self.defaults_command(&options),
        }
    }

    /// Handle the layout command
    fn layout_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        engine: EngineChoice,
        config: &ConfigArgs,
        pretty: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let config = self.build_config(config)?;

        let outcome = match engine {
            EngineChoice::Builtin => {
                block_on_layout(Orchestrator::new(SugiyamaEngine::new(), config), graph)?
            }
            EngineChoice::None => {
                block_on_layout(Orchestrator::new(UnavailableEngine, config), graph)?
            }
        };

        if self.verbose {
            eprintln!(
                "Laid out {} nodes and {} edges{}",
                outcome.nodes.len(),
                outcome.edges.len(),
                if outcome.used_fallback {
                    " using the fallback layout"
                } else {
                    ""
                }
            );
        }

        self.write_output(output, &to_json(&outcome, pretty)?)
    }

    /// Handle the place command
    #[allow(clippy::too_many_arguments)]
    fn place_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        node: &str,
        anchor: Option<Position>,
        strategy: StrategyChoice,
        config: &ConfigArgs,
        pretty: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let record: NodeRecord =
            serde_json::from_str(node).context("Failed to parse --node as a node record")?;

        let orchestrator = Orchestrator::with_builtin_engine(self.build_config(config)?);
        let graph = orchestrator.normalize(graph);
        let placed = orchestrator.place_node(&graph, record, anchor, strategy.into());

        if self.verbose {
            if let Some(node) = placed.nodes.last() {
                eprintln!("Placed '{}' at {}", node.id, node.position);
            }
        }

        self.write_output(output, &to_json(&placed, pretty)?)
    }

    /// Handle the complete command
    fn complete_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        config: &ConfigArgs,
        pretty: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let orchestrator = Orchestrator::with_builtin_engine(self.build_config(config)?);
        let mut graph = orchestrator.normalize(graph);
        let added = complete_graph(&mut graph);

        if self.verbose {
            eprintln!("Added {} edges", added);
        }

        self.write_output(output, &to_json(&graph, pretty)?)
    }

    /// Handle the defaults command
    fn defaults_command(&self, config: &ConfigArgs) -> Result<()> {
        let config = self.build_config(config)?;
        self.write_output(None, &to_json(&config, true)?)
    }

    /// Resolve surface preset, config file and direction override
    pub fn build_config(&self, args: &ConfigArgs) -> Result<LayoutConfig> {
        let surface = EditorSurface::from(args.surface);
        let mut config = match &args.config {
            Some(path) => LayoutConfig::from_file(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?
                .with_surface(surface),
            None => LayoutConfig::for_surface(surface),
        };

        if let Some(direction) = &args.direction {
            let direction = Direction::from_str(direction)
                .ok_or_else(|| anyhow!("Unknown direction '{}'", direction))?;
            config = config.with_direction(direction);
        }
        Ok(config)
    }

    /// Read and parse an input graph
    fn read_graph(&self, input: Option<PathBuf>) -> Result<RawGraph> {
        let content = self.read_input(input)?;
        if self.verbose {
            eprintln!("Read {} bytes of input", content.len());
        }
        let graph = parse_graph(&content).context("Failed to parse input graph")?;
        debug!(
            node_count = graph.nodes.len(),
            edge_count = graph.edges.len(),
            "Read input graph"
        );
        Ok(graph)
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        let content = if content.is_empty() || content.ends_with('\n') {
            content.to_string()
        } else {
            format!("{}\n", content)
        };

        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, &content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                print!("{}", content);
                io::stdout().flush()?;
            }
        }
        Ok(())
    }
}

impl Default for FlowgraphApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one full relayout on a single-threaded runtime
fn block_on_layout<E: LayeredLayoutEngine>(
    orchestrator: Orchestrator<E>,
    graph: RawGraph,
) -> Result<LayoutOutcome> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(orchestrator.full_relayout(graph)))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
