//! Error types for dispatcher-export
//!
//! Each component defines its own `thiserror` enum; this module gathers them
//! into one crate-level type. Per-message problems never reach here: the
//! extractor reduces them to "no record".

use thiserror::Error;

use crate::sink::SinkError;
use crate::source::SourceError;

/// Fatal errors that end an export run
#[derive(Error, Debug)]
pub enum ExportError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broker connection or consumption failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Output destination failure
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for dispatcher-export operations
///
/// Uses `anyhow::Error` so context can be attached on the way up to `main`.
pub type Result<T> = anyhow::Result<T>;
