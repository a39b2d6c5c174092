//! Export pipeline
//!
//! Wires the topic source, record extractor, and CSV sink into one pull-based
//! pass: the sink pulls records, the extractor pulls raw messages, and the
//! source blocks for at most the idle timeout per message.

use std::io::Write;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::extractor::RecordExtractor;
use crate::sink::{CsvSink, OutputTarget};
use crate::source::{KafkaSourceConfig, RawMessage, SourceError, TopicSource};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Messages read from the topic.
    pub messages: u64,
    /// Rows written, excluding the header.
    pub records: u64,
}

/// Streams `messages` through `extractor` into `sink`.
///
/// Stops at the first source or sink error. Messages that do not yield a
/// record are skipped.
pub fn export<I, W>(
    messages: I,
    extractor: &RecordExtractor,
    sink: &mut CsvSink<W>,
) -> std::result::Result<ExportSummary, ExportError>
where
    I: IntoIterator<Item = std::result::Result<RawMessage, SourceError>>,
    W: Write,
{
    let mut seen = 0u64;
    let records = messages.into_iter().filter_map(|item| match item {
        Ok(raw) => {
            seen += 1;
            extractor.extract(&raw).map(Ok)
        }
        Err(e) => Some(Err(ExportError::from(e))),
    });

    let written = sink.write_all(records)?;

    Ok(ExportSummary {
        messages: seen,
        records: written,
    })
}

/// Runs one export with a validated configuration.
///
/// The broker connection is established before the destination is opened,
/// so a startup failure leaves no output behind.
///
/// # Errors
///
/// Returns error on configuration, connection, consumption, or output
/// failures. Malformed or non-matching messages are not errors.
pub fn run(config: &Config) -> Result<ExportSummary> {
    let source_config = KafkaSourceConfig::from_settings(&config.kafka)
        .map_err(|e| ExportError::Config(e.to_string()))?;
    let extractor = RecordExtractor::new(&config.filter.request_type);
    let target = OutputTarget::parse(&config.output.path);

    info!(
        topic = %source_config.topic,
        filter = %extractor.summary(),
        output = %target,
        idle_timeout_ms = config.kafka.timeout_ms,
        "Starting export"
    );

    let messages = TopicSource::connect(&source_config)?;
    let mut sink = CsvSink::new(target.open()?)?;

    let summary = export(messages, &extractor, &mut sink)?;
    sink.finish()?;

    if summary.messages > 0 && summary.records == 0 {
        warn!(
            messages = summary.messages,
            filter = %extractor.summary(),
            "No message matched the filter"
        );
    }

    info!(
        messages = summary.messages,
        records = summary.records,
        output = %target,
        "Export finished"
    );

    Ok(summary)
}
