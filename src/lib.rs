//! dispatcher-export - Kafka to CSV export of DISPATCHER requests
//!
//! Drains a Kafka topic from its earliest offset, keeps the messages whose
//! `requestHeader.type` is `DISPATCHER`, and writes their correlation id,
//! migration run id, and email as fully quoted CSV. The run ends once the
//! topic has been quiet for the idle timeout.
//!
//! # Architecture
//!
//! - `source`: Kafka connection and the idle-bounded message iterator
//! - `extractor`: JSON decoding, request type filter, and field projection
//! - `sink`: CSV serialization and output destination selection
//! - `pipeline`: wiring of the three stages for one run
//! - `config`: Configuration loading and validation
//! - `cli`: Command-line interface definition
//! - `logging`: Diagnostic output setup
//! - `error`: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use dispatcher_export::{pipeline, Cli, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load(&Cli::default())?;
//!     config.validate()?;
//!
//!     let summary = pipeline::run(&config)?;
//!     eprintln!("wrote {} rows", summary.records);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use cli::Cli;
pub use config::Config;
pub use error::{ExportError, Result};
pub use extractor::{OutputRecord, RecordExtractor};
pub use pipeline::{export, ExportSummary};
pub use sink::{CsvSink, OutputTarget};
pub use source::{RawMessage, TopicSource};
