//! CSV output
//!
//! Writes [`OutputRecord`]s as CSV with a fixed header, every field quoted,
//! and `\n` line endings.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;
use tracing::debug;

use crate::extractor::OutputRecord;

/// Column names, in output order.
pub const HEADER: [&str; 3] = ["correlationId", "migrationRunId", "email"];

/// Errors that can occur while writing output.
#[derive(Error, Debug)]
pub enum SinkError {
    /// CSV encoding or write failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The destination could not be opened or flushed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// Where the CSV goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    Stdout,
    /// A file, created or truncated.
    File(PathBuf),
}

impl OutputTarget {
    /// Interprets `-` as standard output and anything else as a file path.
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(value))
        }
    }

    /// Opens the destination for writing.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Io` if the file cannot be created.
    pub fn open(&self) -> Result<Box<dyn Write>, SinkError> {
        match self {
            Self::Stdout => Ok(Box::new(io::stdout().lock())),
            Self::File(path) => {
                debug!(path = %path.display(), "Creating output file");
                Ok(Box::new(File::create(path)?))
            }
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Streaming CSV writer for output records.
///
/// The header is written on construction, so even a run with no records
/// produces it.
///
/// # Examples
///
/// ```
/// use dispatcher_export::extractor::OutputRecord;
/// use dispatcher_export::sink::CsvSink;
///
/// let mut sink = CsvSink::new(Vec::new()).unwrap();
/// sink.write_record(&OutputRecord {
///     correlation_id: "c1".to_string(),
///     migration_run_id: String::new(),
///     email: "a@b.com".to_string(),
/// })
/// .unwrap();
///
/// let bytes = sink.into_inner().unwrap();
/// assert_eq!(
///     String::from_utf8(bytes).unwrap(),
///     "\"correlationId\",\"migrationRunId\",\"email\"\n\"c1\",\"\",\"a@b.com\"\n"
/// );
/// ```
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> CsvSink<W> {
    /// Wraps `inner` and writes the header row.
    ///
    /// # Arguments
    ///
    /// * `inner` - Destination for the CSV bytes
    ///
    /// # Returns
    ///
    /// Returns a sink with the header already written and no data rows
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Csv` if the header cannot be written.
    pub fn new(inner: W) -> Result<Self, SinkError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        writer.write_record(HEADER)?;

        Ok(Self { writer, rows: 0 })
    }

    /// Writes one data row.
    pub fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    /// Writes every record in order, stopping at the first error from either
    /// the input or the writer.
    ///
    /// Returns the number of rows written by this call.
    pub fn write_all<I, E>(&mut self, records: I) -> Result<u64, E>
    where
        I: IntoIterator<Item = Result<OutputRecord, E>>,
        E: From<SinkError>,
    {
        let before = self.rows;
        for record in records {
            self.write_record(&record?)?;
        }
        Ok(self.rows - before)
    }

    /// Rows written so far, excluding the header.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes buffered output and returns the row count.
    pub fn finish(mut self) -> Result<u64, SinkError> {
        self.writer.flush()?;
        Ok(self.rows)
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(correlation_id: &str, migration_run_id: &str, email: &str) -> OutputRecord {
        OutputRecord {
            correlation_id: correlation_id.to_string(),
            migration_run_id: migration_run_id.to_string(),
            email: email.to_string(),
        }
    }

    fn render(records: Vec<OutputRecord>) -> String {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        let written = sink
            .write_all(records.into_iter().map(Ok::<_, SinkError>))
            .unwrap();
        assert_eq!(written, sink.rows());
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_input_yields_header_only() {
        assert_eq!(render(vec![]), "\"correlationId\",\"migrationRunId\",\"email\"\n");
    }

    #[test]
    fn test_every_field_is_quoted() {
        let output = render(vec![record("c1", "m1", "a@b.com")]);
        assert_eq!(output.lines().nth(1), Some("\"c1\",\"m1\",\"a@b.com\""));
    }

    #[test]
    fn test_no_carriage_returns() {
        let output = render(vec![record("c1", "", "a@b.com"), record("c2", "", "c@d.com")]);
        assert!(!output.contains('\r'));
        assert_eq!(output.matches('\n').count(), 3);
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let output = render(vec![record("a,b", "say \"hi\"", "x@y.com")]);
        assert_eq!(
            output.lines().nth(1),
            Some("\"a,b\",\"say \"\"hi\"\"\",\"x@y.com\"")
        );
    }

    #[test]
    fn test_rows_keep_input_order() {
        let output = render(vec![
            record("3", "", "c@x.com"),
            record("1", "", "a@x.com"),
            record("2", "", "b@x.com"),
        ]);
        let ids: Vec<&str> = output.lines().skip(1).map(|l| &l[1..2]).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_write_all_stops_at_first_error() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        let input = vec![
            Ok(record("1", "", "a@x.com")),
            Err(SinkError::Io(io::Error::new(io::ErrorKind::Other, "boom"))),
            Ok(record("2", "", "b@x.com")),
        ];

        assert!(sink.write_all(input).is_err());
        assert_eq!(sink.rows(), 1);
    }

    #[test]
    fn test_output_target_parse() {
        assert_eq!(OutputTarget::parse("-"), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::parse("out.csv"),
            OutputTarget::File(PathBuf::from("out.csv"))
        );
        assert_eq!(OutputTarget::Stdout.to_string(), "stdout");
    }

    #[test]
    fn test_file_target_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.csv");
        let target = OutputTarget::File(path.clone());

        let mut sink = CsvSink::new(target.open().unwrap()).unwrap();
        sink.write_record(&record("c1", "", "x@y.com")).unwrap();
        assert_eq!(sink.finish().unwrap(), 1);

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            contents,
            "\"correlationId\",\"migrationRunId\",\"email\"\n\"c1\",\"\",\"x@y.com\"\n"
        );
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::File(dir.path().join("missing").join("out.csv"));
        assert!(matches!(target.open(), Err(SinkError::Io(_))));
    }
}
