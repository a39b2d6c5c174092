//! Configuration management for dispatcher-export
//!
//! Configuration is assembled once at startup from built-in defaults, an
//! optional YAML file, and command-line flags (which already include their
//! environment variable fallbacks), then validated and passed by value into
//! the pipeline.

use crate::cli::Cli;
use crate::error::{ExportError, Result};
use crate::extractor::DISPATCHER_TYPE;
use crate::source::config::{KafkaSourceConfig, DEFAULT_GROUP_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Broker connection and consumption settings
    #[serde(default)]
    pub kafka: KafkaConfig,

    /// Record filter settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Output destination
    #[serde(default)]
    pub output: OutputConfig,

    /// Diagnostic logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Kafka connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Kafka brokers (comma-separated)
    #[serde(default)]
    pub brokers: String,

    /// Topic to drain
    #[serde(default)]
    pub topic: String,

    /// Consumer group ID
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Idle timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Startup metadata timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Security configuration
    #[serde(default)]
    pub security: KafkaSecurityConfig,
}

/// Kafka security configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct KafkaSecurityConfig {
    /// Security protocol (PLAINTEXT, SSL, SASL_PLAINTEXT, SASL_SSL)
    #[serde(default = "default_security_protocol")]
    pub protocol: String,

    /// SASL mechanism (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    pub sasl_mechanism: Option<String>,

    /// SASL username
    pub sasl_username: Option<String>,

    /// SASL password (prefer DISPATCHER_KAFKA_SASL_PASSWORD)
    pub sasl_password: Option<String>,

    /// CA certificate path for TLS
    pub ssl_ca_location: Option<String>,
}

impl std::fmt::Debug for KafkaSecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSecurityConfig")
            .field("protocol", &self.protocol)
            .field("sasl_mechanism", &self.sasl_mechanism)
            .field("sasl_username", &self.sasl_username)
            .field(
                "sasl_password",
                &self.sasl_password.as_ref().map(|_| "<redacted>"),
            )
            .field("ssl_ca_location", &self.ssl_ca_location)
            .finish()
    }
}

/// Record filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Value `requestHeader.type` must equal
    #[serde(default = "default_request_type")]
    pub request_type: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV destination path, `-` for stdout
    #[serde(default = "default_output_path")]
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive, e.g. `dispatcher_export=info` or `debug`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON-formatted logs
    #[serde(default)]
    pub json_format: bool,

    /// Log file path (if None, stderr only)
    pub file_path: Option<PathBuf>,
}

fn default_group_id() -> String {
    DEFAULT_GROUP_ID.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_security_protocol() -> String {
    "PLAINTEXT".to_string()
}

fn default_request_type() -> String {
    DISPATCHER_TYPE.to_string()
}

fn default_output_path() -> String {
    "-".to_string()
}

fn default_log_level() -> String {
    "dispatcher_export=info".to_string()
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: String::new(),
            topic: String::new(),
            group_id: default_group_id(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            security: KafkaSecurityConfig::default(),
        }
    }
}

impl Default for KafkaSecurityConfig {
    fn default() -> Self {
        Self {
            protocol: default_security_protocol(),
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            ssl_ca_location: None,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            request_type: default_request_type(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the optional file named on the command line,
    /// then apply command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly given file cannot be read or parsed
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExportError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(ExportError::from)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        let kafka = &mut self.kafka;
        if let Some(brokers) = &cli.bootstrap_servers {
            kafka.brokers = brokers.clone();
        }
        if let Some(topic) = &cli.topic {
            kafka.topic = topic.clone();
        }
        if let Some(group_id) = &cli.group_id {
            kafka.group_id = group_id.clone();
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            kafka.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = cli.connect_timeout_ms {
            kafka.connect_timeout_ms = connect_timeout_ms;
        }

        let security = &mut kafka.security;
        if let Some(protocol) = &cli.security_protocol {
            security.protocol = protocol.clone();
        }
        if cli.sasl_mechanism.is_some() {
            security.sasl_mechanism = cli.sasl_mechanism.clone();
        }
        if cli.sasl_username.is_some() {
            security.sasl_username = cli.sasl_username.clone();
        }
        if cli.sasl_password.is_some() {
            security.sasl_password = cli.sasl_password.clone();
        }
        if cli.ssl_ca_location.is_some() {
            security.ssl_ca_location = cli.ssl_ca_location.clone();
        }

        if let Some(request_type) = &cli.request_type {
            self.filter.request_type = request_type.clone();
        }
        if let Some(output) = &cli.output {
            self.output.path = output.clone();
        }

        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
        if cli.json_logs {
            self.logging.json_format = true;
        }
        if cli.log_file.is_some() {
            self.logging.file_path = cli.log_file.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Config` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.kafka.brokers.trim().is_empty() {
            return Err(ExportError::Config(
                "bootstrap servers are required (--bootstrap-servers)".to_string(),
            )
            .into());
        }

        if self.kafka.topic.trim().is_empty() {
            return Err(ExportError::Config("topic is required (--topic)".to_string()).into());
        }

        if self.kafka.group_id.trim().is_empty() {
            return Err(ExportError::Config("group_id cannot be empty".to_string()).into());
        }

        if self.kafka.timeout_ms == 0 {
            return Err(
                ExportError::Config("timeout_ms must be greater than 0".to_string()).into(),
            );
        }

        if self.kafka.connect_timeout_ms == 0 {
            return Err(ExportError::Config(
                "connect_timeout_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.filter.request_type.is_empty() {
            return Err(ExportError::Config("request_type cannot be empty".to_string()).into());
        }

        if self.output.path.is_empty() {
            return Err(ExportError::Config("output path cannot be empty".to_string()).into());
        }

        KafkaSourceConfig::from_settings(&self.kafka)
            .map_err(|e| ExportError::Config(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["dispatcher-export"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.kafka.brokers = "localhost:9092".to_string();
        config.kafka.topic = "migration-requests".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.kafka.group_id, "dispatcher-email-extractor");
        assert_eq!(config.kafka.timeout_ms, 5000);
        assert_eq!(config.kafka.security.protocol, "PLAINTEXT");
        assert_eq!(config.filter.request_type, "DISPATCHER");
        assert_eq!(config.output.path, "-");
        assert_eq!(config.logging.level, "dispatcher_export=info");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_missing_brokers() {
        let mut config = valid_config();
        config.kafka.brokers.clear();
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("bootstrap servers"));
    }

    #[test]
    fn test_config_validation_missing_topic() {
        let mut config = valid_config();
        config.kafka.topic.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = valid_config();
        config.kafka.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_protocol() {
        let mut config = valid_config();
        config.kafka.security.protocol = "TLS".to_string();
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("Invalid security protocol"));
    }

    #[test]
    fn test_config_validation_sasl_without_password() {
        let mut config = valid_config();
        config.kafka.security.protocol = "SASL_SSL".to_string();
        config.kafka.security.sasl_username = Some("u".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let config = Config::load(&cli(&[
            "--bootstrap-servers",
            "b:9092",
            "--topic",
            "t",
            "--timeout-ms",
            "100",
            "--output",
            "out.csv",
            "--verbose",
        ]))
        .unwrap();

        assert_eq!(config.kafka.brokers, "b:9092");
        assert_eq!(config.kafka.topic, "t");
        assert_eq!(config.kafka.timeout_ms, 100);
        assert_eq!(config.output.path, "out.csv");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.kafka.group_id, "dispatcher-email-extractor");
    }

    #[test]
    fn test_config_from_yaml_with_cli_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
kafka:
  brokers: "file-broker:9092"
  topic: "file-topic"
  group_id: "file-group"
  security:
    protocol: "SASL_PLAINTEXT"
    sasl_mechanism: "SCRAM-SHA-256"
    sasl_username: "svc"
    sasl_password: "secret"
output:
  path: "from-file.csv"
logging:
  json_format: true
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = Config::load(&cli(&["--config", &path, "--topic", "cli-topic"])).unwrap();

        assert_eq!(config.kafka.brokers, "file-broker:9092");
        assert_eq!(config.kafka.topic, "cli-topic");
        assert_eq!(config.kafka.group_id, "file-group");
        assert_eq!(config.kafka.timeout_ms, 5000);
        assert_eq!(config.kafka.security.sasl_username.as_deref(), Some("svc"));
        assert_eq!(config.output.path, "from-file.csv");
        assert!(config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = Config::load(&cli(&["--config", "/nonexistent/dispatcher.yaml"]));
        let error = result.unwrap_err();
        assert!(error.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_security_debug_redacts_password() {
        let mut config = valid_config();
        config.kafka.security.sasl_password = Some("hunter2".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
    }
}
