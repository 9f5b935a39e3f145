//! Logging setup
//!
//! Engine components only emit `tracing` spans and events; this module
//! decides where they go. Native builds write to stderr through
//! `tracing-subscriber` so JSON results on stdout stay parseable. WASM builds
//! forward everything to the browser console.
//!
//! ```rust
//! use flowgraph::core::logging::init_logging;
//!
//! // Level and format from the environment, falling back to warn/compact
//! let _ = init_logging(None, None);
//! ```
//!
//! Environment variables, consulted when an argument is `None`:
//!
//! - `FLOWGRAPH_LOG_LEVEL`: a level or a full filter directive
//! - `RUST_LOG`: same, lower precedence
//! - `FLOWGRAPH_LOG_FORMAT`: `compact`, `pretty` or `json`
//!
//! ```bash
//! # Trace why a relayout fell back
//! RUST_LOG="warn,flowgraph::engine::primary=debug" flowgraph layout -i graph.json
//!
//! # Watch every probe of the radial search
//! RUST_LOG="flowgraph::engine::placement=trace" flowgraph place -i graph.json --x 0 --y 0
//! ```

use std::fmt;
use std::str::FromStr;

const DEFAULT_LEVEL: &str = "warn";
const LEVEL_ENV: &str = "FLOWGRAPH_LOG_LEVEL";
const FORMAT_ENV: &str = "FLOWGRAPH_LOG_FORMAT";

/// Output formats of the native subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event, no span enter/exit noise
    #[default]
    Compact,
    /// Multi-line with source locations and span activity
    Pretty,
    /// Newline-delimited JSON for log collectors
    Json,
}

impl LogFormat {
    /// Accepted format names
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "Unknown log format: {} (expected one of {})",
                other,
                Self::variants().join(", ")
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// Level directive and format after applying argument/environment precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub directive: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Resolve settings from explicit values, then the environment
    pub fn resolve(level: Option<&str>, format: Option<&str>) -> Result<Self, String> {
        let directive = level
            .map(str::to_string)
            .or_else(|| std::env::var(LEVEL_ENV).ok())
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

        let format = match format
            .map(str::to_string)
            .or_else(|| std::env::var(FORMAT_ENV).ok())
        {
            Some(name) => LogFormat::from_str(&name)?,
            None => LogFormat::default(),
        };

        Ok(Self { directive, format })
    }
}

/// Install the global subscriber
///
/// * `level` - `trace|debug|info|warn|error|off` or any `EnvFilter`
///   directive. `None` reads `FLOWGRAPH_LOG_LEVEL`, then `RUST_LOG`, then
///   uses `warn`.
/// * `format` - `compact|pretty|json`. `None` reads `FLOWGRAPH_LOG_FORMAT`,
///   then uses `compact`.
///
/// Fails for an unknown format, an invalid directive, or when a global
/// subscriber is already installed.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{
        fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
        Registry,
    };

    let settings = LogSettings::resolve(level, format)?;
    let filter = EnvFilter::try_new(&settings.directive)
        .map_err(|e| format!("Invalid log level '{}': {}", settings.directive, e))?;

    let base = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let output = match settings.format {
        LogFormat::Compact => base
            .compact()
            .with_target(false)
            .with_span_events(FmtSpan::NONE)
            .boxed(),
        LogFormat::Pretty => base
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::ACTIVE)
            .boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    Registry::default().with(output).with(filter).try_init()?;
    Ok(())
}

/// Route events to the browser console
///
/// Level and format are chosen in the devtools, so both arguments are
/// ignored.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(
    _level: Option<&str>,
    _format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing_wasm::set_as_global_default_with_config(tracing_wasm::WASMLayerConfig::default());
    Ok(())
}

/// [`init_logging`] from the environment only
pub fn init_default_logging() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(None, None)
}
