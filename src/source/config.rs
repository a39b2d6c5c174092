//! Kafka connection settings for the topic source.
//!
//! The loose, serde-friendly [`KafkaConfig`](crate::config::KafkaConfig)
//! section of the application configuration is resolved here into a typed
//! [`KafkaSourceConfig`] whose security options have been parsed and checked.
//!
//! # Example
//!
//! ```rust
//! use dispatcher_export::source::config::{KafkaSourceConfig, SaslMechanism, SecurityProtocol};
//!
//! let config = KafkaSourceConfig::new("localhost:9092", "migration-requests")
//!     .with_security_protocol(SecurityProtocol::SaslSsl)
//!     .with_sasl(SaslMechanism::ScramSha512, "user", "secret");
//!
//! assert_eq!(config.security_protocol, SecurityProtocol::SaslSsl);
//! assert_eq!(config.group_id, "dispatcher-email-extractor");
//! ```

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::KafkaConfig;

/// Consumer group used when none is configured.
pub const DEFAULT_GROUP_ID: &str = "dispatcher-email-extractor";

/// Idle window after which the source reports end of stream.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Upper bound on the startup metadata round trip.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while resolving source configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required configuration value.
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// Invalid security protocol specified.
    #[error("Invalid security protocol: {0}")]
    InvalidSecurityProtocol(String),

    /// Invalid SASL mechanism specified.
    #[error("Invalid SASL mechanism: {0}")]
    InvalidSaslMechanism(String),
}

/// Security protocol for the broker connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecurityProtocol {
    /// No encryption or authentication.
    #[default]
    Plaintext,
    /// TLS encryption without SASL.
    Ssl,
    /// SASL authentication without TLS.
    SaslPlaintext,
    /// SASL authentication with TLS encryption.
    SaslSsl,
}

impl SecurityProtocol {
    /// Returns the librdkafka configuration string for this protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        }
    }

    /// Whether this protocol authenticates with SASL.
    pub fn uses_sasl(&self) -> bool {
        matches!(self, Self::SaslPlaintext | Self::SaslSsl)
    }

    /// Whether this protocol encrypts with TLS.
    pub fn uses_tls(&self) -> bool {
        matches!(self, Self::Ssl | Self::SaslSsl)
    }
}

impl FromStr for SecurityProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            "SASL_PLAINTEXT" => Ok(Self::SaslPlaintext),
            "SASL_SSL" => Ok(Self::SaslSsl),
            _ => Err(ConfigError::InvalidSecurityProtocol(s.to_string())),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaslMechanism {
    /// PLAIN mechanism (username/password in clear text).
    #[default]
    Plain,
    /// SCRAM-SHA-256 mechanism.
    ScramSha256,
    /// SCRAM-SHA-512 mechanism.
    ScramSha512,
}

impl SaslMechanism {
    /// Returns the librdkafka configuration string for this mechanism.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLAIN" => Ok(Self::Plain),
            "SCRAM-SHA-256" => Ok(Self::ScramSha256),
            "SCRAM-SHA-512" => Ok(Self::ScramSha512),
            _ => Err(ConfigError::InvalidSaslMechanism(s.to_string())),
        }
    }
}

/// SASL credentials.
#[derive(Clone)]
pub struct SaslConfig {
    /// Authentication mechanism to use.
    pub mechanism: SaslMechanism,
    /// SASL username.
    pub username: String,
    /// SASL password.
    pub password: String,
}

impl std::fmt::Debug for SaslConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslConfig")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// TLS settings.
#[derive(Debug, Clone, Default)]
pub struct SslConfig {
    /// Path to CA certificate file.
    pub ca_location: Option<String>,
}

/// Resolved configuration for [`TopicSource`](super::TopicSource).
#[derive(Debug, Clone)]
pub struct KafkaSourceConfig {
    /// Kafka broker addresses (comma-separated).
    pub brokers: String,

    /// Topic to drain.
    pub topic: String,

    /// Consumer group identity. Offsets are never committed under it.
    pub group_id: String,

    /// Security protocol for the connection.
    pub security_protocol: SecurityProtocol,

    /// SASL credentials (present for SASL protocols).
    pub sasl_config: Option<SaslConfig>,

    /// TLS settings.
    pub ssl_config: Option<SslConfig>,

    /// Maximum gap between messages before the stream is considered drained.
    pub idle_timeout: Duration,

    /// Bound on the startup metadata fetch.
    pub connect_timeout: Duration,
}

impl KafkaSourceConfig {
    /// Creates a plaintext configuration with default group and timeouts.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Comma-separated broker addresses
    /// * `topic` - Topic to drain
    ///
    /// # Returns
    ///
    /// Returns a configuration using `DEFAULT_GROUP_ID`,
    /// `DEFAULT_IDLE_TIMEOUT`, and `DEFAULT_CONNECT_TIMEOUT`
    pub fn new(brokers: &str, topic: &str) -> Self {
        Self {
            brokers: brokers.to_string(),
            topic: topic.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            security_protocol: SecurityProtocol::default(),
            sasl_config: None,
            ssl_config: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets a custom consumer group ID.
    pub fn with_group_id(mut self, group_id: &str) -> Self {
        self.group_id = group_id.to_string();
        self
    }

    /// Sets the idle window that ends the stream.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Sets the security protocol.
    pub fn with_security_protocol(mut self, protocol: SecurityProtocol) -> Self {
        self.security_protocol = protocol;
        self
    }

    /// Sets SASL credentials.
    pub fn with_sasl(mut self, mechanism: SaslMechanism, username: &str, password: &str) -> Self {
        self.sasl_config = Some(SaslConfig {
            mechanism,
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Configures TLS with a CA certificate.
    pub fn with_ssl(mut self, ca_location: &str) -> Self {
        self.ssl_config = Some(SslConfig {
            ca_location: Some(ca_location.to_string()),
        });
        self
    }

    /// Resolves the application's Kafka section into a typed source config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSecurityProtocol` or
    /// `ConfigError::InvalidSaslMechanism` for unknown names, and
    /// `ConfigError::MissingConfig` when a SASL protocol is selected without
    /// both username and password.
    pub fn from_settings(settings: &KafkaConfig) -> Result<Self, ConfigError> {
        if settings.brokers.trim().is_empty() {
            return Err(ConfigError::MissingConfig("bootstrap servers".to_string()));
        }
        if settings.topic.trim().is_empty() {
            return Err(ConfigError::MissingConfig("topic".to_string()));
        }

        let security = &settings.security;
        let protocol: SecurityProtocol = security.protocol.parse()?;

        let mut config = Self::new(&settings.brokers, &settings.topic)
            .with_group_id(&settings.group_id)
            .with_idle_timeout(Duration::from_millis(settings.timeout_ms))
            .with_security_protocol(protocol);
        config.connect_timeout = Duration::from_millis(settings.connect_timeout_ms);

        if protocol.uses_sasl() {
            let username = security
                .sasl_username
                .as_deref()
                .ok_or_else(|| ConfigError::MissingConfig("SASL username".to_string()))?;
            let password = security
                .sasl_password
                .as_deref()
                .ok_or_else(|| ConfigError::MissingConfig("SASL password".to_string()))?;
            let mechanism = match &security.sasl_mechanism {
                Some(name) => name.parse()?,
                None => SaslMechanism::default(),
            };

            config = config.with_sasl(mechanism, username, password);
        }

        if let Some(ca) = &security.ssl_ca_location {
            if !protocol.uses_tls() {
                warn!(
                    protocol = %protocol.as_str(),
                    "CA location is ignored by a non-TLS security protocol"
                );
            }
            config = config.with_ssl(ca);
        }

        Ok(config)
    }

    /// Returns the librdkafka client settings as key-value pairs.
    ///
    /// Offsets start at the earliest retained message and are never
    /// committed or stored, so repeated runs read the same history.
    pub fn client_settings(&self) -> Vec<(String, String)> {
        let mut settings = vec![
            ("bootstrap.servers".to_string(), self.brokers.clone()),
            ("group.id".to_string(), self.group_id.clone()),
            ("auto.offset.reset".to_string(), "earliest".to_string()),
            ("enable.auto.commit".to_string(), "false".to_string()),
            ("enable.auto.offset.store".to_string(), "false".to_string()),
            ("enable.partition.eof".to_string(), "false".to_string()),
            (
                "client.id".to_string(),
                format!("{}-{}", DEFAULT_GROUP_ID, std::process::id()),
            ),
            (
                "security.protocol".to_string(),
                self.security_protocol.as_str().to_string(),
            ),
        ];

        if let Some(sasl) = &self.sasl_config {
            settings.push((
                "sasl.mechanism".to_string(),
                sasl.mechanism.as_str().to_string(),
            ));
            settings.push(("sasl.username".to_string(), sasl.username.clone()));
            settings.push(("sasl.password".to_string(), sasl.password.clone()));
        }

        if let Some(ca) = self.ssl_config.as_ref().and_then(|s| s.ca_location.as_ref()) {
            settings.push(("ssl.ca.location".to_string(), ca.clone()));
        }

        settings
    }
}
