//! Stack node entry point.

use anyhow::{Context, Result};
use stack_node::{load_config, log_metrics_snapshot, StackNode};
use stack_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = load_config()?;
    let node = StackNode::start(config)?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    node.shutdown().await?;
    log_metrics_snapshot();

    Ok(())
}
