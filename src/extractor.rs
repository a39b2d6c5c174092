//! Record extraction for dispatcher requests
//!
//! Decodes raw message payloads, keeps only envelopes whose request header
//! carries the configured type, and projects them into [`OutputRecord`]s.
//! Extraction never fails: anything that cannot be turned into a record
//! yields `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::source::RawMessage;

/// Request type selected by default.
pub const DISPATCHER_TYPE: &str = "DISPATCHER";

/// Decoded message envelope.
///
/// Both sections must be JSON objects; anything else fails to deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Request metadata (`type`, `correlationId`, `migrationRunId`, ...).
    #[serde(rename = "requestHeader")]
    pub request_header: Map<String, Value>,

    /// Request payload (`email`, ...).
    #[serde(rename = "requestBody")]
    pub request_body: Map<String, Value>,
}

/// One exported row.
///
/// `email` is never empty; the ids fall back to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    /// Correlation id from the request header.
    #[serde(rename = "correlationId")]
    pub correlation_id: String,

    /// Migration run id from the request header.
    #[serde(rename = "migrationRunId")]
    pub migration_run_id: String,

    /// Email from the request body.
    pub email: String,
}

/// Filters and projects raw messages into output records.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    request_type: String,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(DISPATCHER_TYPE)
    }
}

impl RecordExtractor {
    /// Creates an extractor for one request type.
    ///
    /// # Arguments
    ///
    /// * `request_type` - Value `requestHeader.type` must equal, compared
    ///   case-sensitively
    ///
    /// # Returns
    ///
    /// Returns an extractor that keeps only envelopes of that type
    ///
    /// # Examples
    ///
    /// ```
    /// use dispatcher_export::extractor::RecordExtractor;
    ///
    /// let extractor = RecordExtractor::new("ROUTER");
    /// assert_eq!(extractor.summary(), "requestHeader.type=ROUTER");
    /// ```
    pub fn new(request_type: &str) -> Self {
        Self {
            request_type: request_type.to_string(),
        }
    }

    /// Extracts a record from a raw message.
    ///
    /// Payloads that are not valid JSON are reported with their position and
    /// skipped. Valid JSON without the expected envelope shape, with another
    /// request type, or without an email is skipped quietly.
    ///
    /// # Examples
    ///
    /// ```
    /// use dispatcher_export::extractor::RecordExtractor;
    /// use dispatcher_export::source::RawMessage;
    ///
    /// let extractor = RecordExtractor::default();
    /// let raw = RawMessage::new(
    ///     0,
    ///     r#"{"requestHeader":{"type":"DISPATCHER","correlationId":"c1"},"requestBody":{"email":"x@y.com"}}"#,
    /// );
    ///
    /// let record = extractor.extract(&raw).unwrap();
    /// assert_eq!(record.correlation_id, "c1");
    /// assert_eq!(record.migration_run_id, "");
    /// assert_eq!(record.email, "x@y.com");
    /// ```
    pub fn extract(&self, raw: &RawMessage) -> Option<OutputRecord> {
        let Some(payload) = raw.payload.as_deref() else {
            warn!(position = %raw.position, "Skipping message without payload");
            return None;
        };

        let value: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    position = %raw.position,
                    offset = raw.offset(),
                    error = %e,
                    "Skipping non-JSON message"
                );
                return None;
            }
        };

        // Structs also deserialize from arrays; only objects are envelopes.
        if !value.is_object() {
            debug!(position = %raw.position, "Skipping non-object message");
            return None;
        }

        let envelope: Envelope = match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(
                    position = %raw.position,
                    error = %e,
                    "Skipping message without request envelope"
                );
                return None;
            }
        };

        self.project(&envelope)
    }

    /// Applies the type filter and builds the record.
    pub fn project(&self, envelope: &Envelope) -> Option<OutputRecord> {
        let header = &envelope.request_header;

        match header.get("type") {
            Some(Value::String(t)) if *t == self.request_type => {}
            _ => return None,
        }

        let email = envelope.request_body.get("email").and_then(email_text)?;

        Some(OutputRecord {
            correlation_id: header_text(header, "correlationId"),
            migration_run_id: header_text(header, "migrationRunId"),
            email,
        })
    }

    /// Human-readable description of the active filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dispatcher_export::extractor::RecordExtractor;
    ///
    /// assert_eq!(RecordExtractor::default().summary(), "requestHeader.type=DISPATCHER");
    /// ```
    pub fn summary(&self) -> String {
        format!("requestHeader.type={}", self.request_type)
    }
}

/// Email value as text.
///
/// Null, `false`, zero, the empty string, and arrays or objects count as no
/// email. Other scalars are rendered like header values.
fn email_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Bool(true) => Some(value.to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Header value as text: strings verbatim, missing or null as empty, other
/// scalars in their JSON form.
fn header_text(header: &Map<String, Value>, key: &str) -> String {
    match header.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
