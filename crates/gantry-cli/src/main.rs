//! Gantry CLI
//!
//! Renders and reconciles the Redis component against a cluster.

use clap::Parser;

use gantry_cli::{Cli, Result};
use gantry_common::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        format: cli.log_format.into(),
        ..Default::default()
    })?;

    cli.run().await
}
