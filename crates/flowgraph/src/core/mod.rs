//! Core abstractions shared by every engine component
//!
//! The canonical data model, raw input records, configuration, error types
//! and logging setup.

mod config;
mod error;
pub mod logging;
mod record;
mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use record::*;
pub use types::*;
