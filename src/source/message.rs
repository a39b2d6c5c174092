//! Raw messages as delivered by the topic source.

use std::fmt;

/// Position of a message within the topic.
///
/// Only used to point diagnostics at the offending message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Partition the message was read from.
    pub partition: i32,
    /// Offset within that partition.
    pub offset: i64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition {} offset {}", self.partition, self.offset)
    }
}

/// One message read from the topic.
///
/// The payload is kept as raw bytes; decoding is left to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Where the message sits in the topic.
    pub position: Position,
    /// Message value. `None` for tombstones.
    pub payload: Option<Vec<u8>>,
}

impl RawMessage {
    /// Creates a message on partition 0 at `offset`.
    pub fn new(offset: i64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            position: Position {
                partition: 0,
                offset,
            },
            payload: Some(payload.into()),
        }
    }

    /// Creates a message with no value.
    pub fn tombstone(offset: i64) -> Self {
        Self {
            position: Position {
                partition: 0,
                offset,
            },
            payload: None,
        }
    }

    /// Offset of the message within its partition.
    pub fn offset(&self) -> i64 {
        self.position.offset
    }
}
