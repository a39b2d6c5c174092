//! Idle-bounded iteration over an unbounded topic.
//!
//! [`IdleBoundedMessages`] turns a blocking poller into an ordinary
//! `Iterator`. It keeps one deadline, pushed forward every time a message is
//! delivered; once the deadline passes without a message the iterator ends.
//! Downstream stages never see the timer.

use std::iter::FusedIterator;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::config::KafkaSourceConfig;
use super::kafka::{KafkaPoller, SourceError};
use super::message::RawMessage;

/// A blocking source of raw messages.
pub trait MessagePoller {
    /// Waits up to `timeout` for the next message.
    ///
    /// Returns `None` when nothing arrived in time, including when the poller
    /// swallowed an error it can recover from. The caller decides whether to
    /// poll again.
    fn poll_message(&mut self, timeout: Duration) -> Option<Result<RawMessage, SourceError>>;
}

/// Messages from a poller, ending once the poller stays quiet for the idle
/// timeout.
///
/// The first error from the poller is yielded and then the iterator ends.
pub struct IdleBoundedMessages<P> {
    poller: P,
    idle_timeout: Duration,
    deadline: Instant,
    delivered: u64,
    finished: bool,
}

/// The Kafka-backed source used by the binary.
pub type TopicSource = IdleBoundedMessages<KafkaPoller>;

impl<P: MessagePoller> IdleBoundedMessages<P> {
    /// Wraps `poller`; the idle clock starts now.
    pub fn new(poller: P, idle_timeout: Duration) -> Self {
        Self {
            poller,
            idle_timeout,
            deadline: Instant::now() + idle_timeout,
            delivered: 0,
            finished: false,
        }
    }
}

impl IdleBoundedMessages<KafkaPoller> {
    /// Connects to the configured topic.
    ///
    /// # Errors
    ///
    /// Connection and authentication failures are returned here, before any
    /// message is read.
    pub fn connect(config: &KafkaSourceConfig) -> Result<Self, SourceError> {
        let poller = KafkaPoller::connect(config)?;
        Ok(Self::new(poller, config.idle_timeout))
    }
}

impl<P: MessagePoller> Iterator for IdleBoundedMessages<P> {
    type Item = Result<RawMessage, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.finished = true;
                info!(
                    delivered = self.delivered,
                    idle_timeout_ms = self.idle_timeout.as_millis() as u64,
                    "No message within idle timeout, ending stream"
                );
                return None;
            }

            match self.poller.poll_message(remaining) {
                Some(Ok(message)) => {
                    self.deadline = Instant::now() + self.idle_timeout;
                    self.delivered += 1;
                    debug!(position = %message.position, "Message received");
                    return Some(Ok(message));
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => continue,
            }
        }
    }
}

impl<P: MessagePoller> FusedIterator for IdleBoundedMessages<P> {}
