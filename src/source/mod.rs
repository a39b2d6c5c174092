//! Topic source
//!
//! Reads a Kafka topic from its earliest retained offset and yields raw
//! messages in arrival order until no message has arrived for the idle
//! timeout.
//!
//! - **Config**: typed connection settings, SASL and TLS options
//! - **Kafka**: the rdkafka `BaseConsumer` behind the [`MessagePoller`] seam
//! - **Stream**: [`IdleBoundedMessages`], the idle-terminated iterator
//!
//! Offsets are never committed, so every run re-reads the same history.
//!
//! # Example
//!
//! ```rust,no_run
//! use dispatcher_export::source::{KafkaSourceConfig, TopicSource};
//!
//! let config = KafkaSourceConfig::new("localhost:9092", "migration-requests");
//! for message in TopicSource::connect(&config)? {
//!     let message = message?;
//!     println!("{}", message.position);
//! }
//! # Ok::<(), dispatcher_export::source::SourceError>(())
//! ```

pub mod config;
pub mod kafka;
pub mod message;
pub mod stream;

pub use config::{
    ConfigError, KafkaSourceConfig, SaslConfig, SaslMechanism, SecurityProtocol, SslConfig,
};
pub use kafka::{KafkaPoller, SourceError};
pub use message::{Position, RawMessage};
pub use stream::{IdleBoundedMessages, MessagePoller, TopicSource};
