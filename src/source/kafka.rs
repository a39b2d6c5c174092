//! rdkafka-backed message poller.
//!
//! [`KafkaPoller`] owns a `BaseConsumer` subscribed to a single topic. It is
//! created by [`TopicSource::connect`](super::TopicSource::connect) and is
//! dropped together with the iterator that wraps it, which closes the broker
//! connection on every exit path.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaError;
use rdkafka::Message;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::KafkaSourceConfig;
use super::message::{Position, RawMessage};
use super::stream::MessagePoller;

/// Errors raised by the topic source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The brokers could not be reached or refused the credentials.
    #[error("Failed to connect to Kafka brokers {brokers}: {source}")]
    Connect {
        /// Broker list that was tried.
        brokers: String,
        /// Underlying client error.
        #[source]
        source: KafkaError,
    },

    /// Error from the Kafka client.
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),
}

/// Polls a single subscribed topic through librdkafka.
pub struct KafkaPoller {
    consumer: BaseConsumer,
    topic: String,
}

impl KafkaPoller {
    /// Creates the consumer, verifies the brokers answer a metadata request,
    /// and subscribes to the configured topic.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Connect` if the metadata request fails within
    /// `connect_timeout`, and `SourceError::Kafka` if the client cannot be
    /// created or the subscription is rejected.
    pub fn connect(config: &KafkaSourceConfig) -> Result<Self, SourceError> {
        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            security_protocol = %config.security_protocol.as_str(),
            "Connecting to Kafka"
        );

        let mut client_config = ClientConfig::new();
        for (key, value) in config.client_settings() {
            client_config.set(key, value);
        }
        let consumer: BaseConsumer = client_config.create()?;

        let metadata = consumer
            .fetch_metadata(Some(&config.topic), config.connect_timeout)
            .map_err(|source| SourceError::Connect {
                brokers: config.brokers.clone(),
                source,
            })?;

        match metadata.topics().iter().find(|t| t.name() == config.topic) {
            Some(topic) if topic.error().is_some() => {
                warn!(
                    topic = %config.topic,
                    error = ?topic.error(),
                    "Topic metadata reported an error; the run will end on idle timeout"
                );
            }
            Some(topic) => {
                debug!(
                    topic = %config.topic,
                    partitions = topic.partitions().len(),
                    "Topic metadata fetched"
                );
            }
            None => {
                warn!(topic = %config.topic, "Topic not present in broker metadata");
            }
        }

        consumer.subscribe(&[config.topic.as_str()])?;

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }
}

impl MessagePoller for KafkaPoller {
    fn poll_message(&mut self, timeout: Duration) -> Option<Result<RawMessage, SourceError>> {
        match self.consumer.poll(timeout)? {
            Ok(message) => Some(Ok(RawMessage {
                position: Position {
                    partition: message.partition(),
                    offset: message.offset(),
                },
                payload: message.payload().map(<[u8]>::to_vec),
            })),
            Err(error) => poll_error(&self.topic, error),
        }
    }
}

/// Sorts a `poll` error into a quiet poll or a fatal error.
///
/// librdkafka keeps retrying after consumption errors such as an unknown
/// topic or a broker transport failure, so they are logged and the idle
/// deadline keeps running. Fatal consumption errors and client failures end
/// the stream.
fn poll_error(topic: &str, error: KafkaError) -> Option<Result<RawMessage, SourceError>> {
    match error {
        KafkaError::MessageConsumption(code) => {
            warn!(topic = %topic, error = %code, "Consumer error, still waiting for messages");
            None
        }
        KafkaError::PartitionEOF(partition) => {
            debug!(topic = %topic, partition, "Reached end of partition");
            None
        }
        other => Some(Err(SourceError::from(other))),
    }
}

impl Drop for KafkaPoller {
    fn drop(&mut self) {
        self.consumer.unsubscribe();
        debug!(topic = %self.topic, "Kafka consumer closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdkafka::types::RDKafkaErrorCode;

    #[test]
    fn test_connect_error_display_names_brokers() {
        let error = SourceError::Connect {
            brokers: "broker-1:9092".to_string(),
            source: KafkaError::MetadataFetch(RDKafkaErrorCode::BrokerTransportFailure),
        };
        let message = error.to_string();
        assert!(message.contains("broker-1:9092"));
        assert!(message.starts_with("Failed to connect"));
    }

    #[test]
    fn test_unknown_topic_is_a_quiet_poll() {
        let outcome = poll_error(
            "missing",
            KafkaError::MessageConsumption(RDKafkaErrorCode::UnknownTopicOrPartition),
        );
        assert!(outcome.is_none());
    }

    #[test]
    fn test_transport_failure_and_partition_eof_are_quiet_polls() {
        assert!(poll_error(
            "t",
            KafkaError::MessageConsumption(RDKafkaErrorCode::BrokerTransportFailure)
        )
        .is_none());
        assert!(poll_error("t", KafkaError::PartitionEOF(0)).is_none());
    }

    #[test]
    fn test_fatal_consumption_error_is_propagated() {
        let outcome = poll_error(
            "t",
            KafkaError::MessageConsumptionFatal(RDKafkaErrorCode::Fatal),
        );
        assert!(matches!(
            outcome,
            Some(Err(SourceError::Kafka(KafkaError::MessageConsumptionFatal(_))))
        ));
    }
}
