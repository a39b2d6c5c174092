//! Command-line interface definition for dispatcher-export
//!
//! Every connection option can also be supplied through an environment
//! variable, and all of them may be set in a YAML file passed with
//! `--config`. Flags win over the file.

use clap::Parser;
use std::path::PathBuf;

/// Drain a Kafka topic and export DISPATCHER request emails as CSV.
///
/// Reads from the earliest offset without committing, and stops once no
/// message has arrived for `--timeout-ms`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dispatcher-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Comma-separated list of Kafka bootstrap servers (host:port)
    #[arg(long, env = "DISPATCHER_KAFKA_BROKERS")]
    pub bootstrap_servers: Option<String>,

    /// Kafka topic to consume from
    #[arg(long, env = "DISPATCHER_KAFKA_TOPIC")]
    pub topic: Option<String>,

    /// Consumer group ID [default: dispatcher-email-extractor]
    #[arg(long, env = "DISPATCHER_KAFKA_GROUP_ID")]
    pub group_id: Option<String>,

    /// Path to output CSV file, '-' for stdout [default: -]
    #[arg(short, long, env = "DISPATCHER_OUTPUT")]
    pub output: Option<String>,

    /// Milliseconds without a new message before stopping [default: 5000]
    #[arg(long, env = "DISPATCHER_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Milliseconds to wait for the brokers at startup [default: 10000]
    #[arg(long, env = "DISPATCHER_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: Option<u64>,

    /// Kafka security protocol (PLAINTEXT, SSL, SASL_PLAINTEXT, SASL_SSL)
    #[arg(long, env = "DISPATCHER_KAFKA_SECURITY_PROTOCOL")]
    pub security_protocol: Option<String>,

    /// SASL mechanism for SASL_* protocols (PLAIN, SCRAM-SHA-256, SCRAM-SHA-512)
    #[arg(long, env = "DISPATCHER_KAFKA_SASL_MECHANISM")]
    pub sasl_mechanism: Option<String>,

    /// SASL username for authenticated clusters
    #[arg(long, env = "DISPATCHER_KAFKA_SASL_USERNAME")]
    pub sasl_username: Option<String>,

    /// SASL password for authenticated clusters
    #[arg(long, env = "DISPATCHER_KAFKA_SASL_PASSWORD", hide_env_values = true)]
    pub sasl_password: Option<String>,

    /// CA certificate for TLS connections
    #[arg(long, env = "DISPATCHER_KAFKA_SSL_CA_LOCATION")]
    pub ssl_ca_location: Option<String>,

    /// Request type to export [default: DISPATCHER]
    #[arg(long)]
    pub request_type: Option<String>,

    /// Path to a YAML configuration file
    #[arg(short, long, env = "DISPATCHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit diagnostics as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Also append diagnostics to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
