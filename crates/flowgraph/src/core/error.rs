//! Core error types
//!
//! The engine itself never fails: every layout entry point returns a usable
//! graph. Errors exist at two seams only. [`LayoutEngineError`] is what a
//! layered layout engine may report (the adapter recovers from all of them),
//! and [`FlowGraphError`] covers the outer surfaces that decode JSON, read
//! files or load configuration.

use thiserror::Error;

/// Failures reported by a layered layout engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutEngineError {
    #[error("Graph contains a cycle through node '{node}'")]
    CyclicGraph { node: String },

    #[error("Edge '{edge}' references unknown node '{node}'")]
    UnknownEndpoint { edge: String, node: String },

    #[error("Layout rejected: {message}")]
    Rejected { message: String },

    #[error("Malformed layout result: {message}")]
    MalformedResult { message: String },

    #[error("No layered layout engine available")]
    Unavailable,
}

impl LayoutEngineError {
    /// Create a rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a malformed-result error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResult {
            message: message.into(),
        }
    }
}

/// Errors at the crate's outer surfaces
#[derive(Error, Debug)]
pub enum FlowGraphError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Config error: {message}")]
    ConfigError { message: String },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl FlowGraphError {
    /// Create a new invalid input error
    pub fn invalid_input(message: String) -> Self {
        Self::InvalidInput { message }
    }

    /// Create a new config error
    pub fn config_error(message: String) -> Self {
        Self::ConfigError { message }
    }
}
