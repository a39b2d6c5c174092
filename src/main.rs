//! dispatcher-export - Kafka to CSV export of DISPATCHER requests
//!
#![doc = "Main entry point for the dispatcher-export tool."]

use anyhow::Result;

use dispatcher_export::cli::Cli;
use dispatcher_export::config::Config;
use dispatcher_export::logging::init_logging;
use dispatcher_export::pipeline;

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = Config::load(&cli)?;

    // Initialize tracing
    init_logging(&config.logging)?;

    // Validate configuration
    config.validate()?;

    let summary = pipeline::run(&config)?;
    tracing::debug!(
        messages = summary.messages,
        records = summary.records,
        "Exiting"
    );

    Ok(())
}
