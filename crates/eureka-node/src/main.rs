//! # Eureka Node
//!
//! Runs a local shout simulation. See the library docs for the startup
//! sequence and `NodeConfig::from_env` for configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use eureka_node::{NodeConfig, Simulation};
use eureka_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and metrics
    let _telemetry = init_telemetry(TelemetryConfig::for_service("node"))
        .context("Failed to initialize telemetry")?;

    // Load configuration
    let config = NodeConfig::from_env().context("Invalid configuration")?;

    info!("===========================================");
    info!("  Eureka Node v{}", env!("CARGO_PKG_VERSION"));
    info!("  Peers: {}", config.peers);
    info!("  Centre: ({}, {})", config.center_lat, config.center_lon);
    info!("===========================================");

    let simulation = Simulation::start(&config).await?;

    match config.run_secs {
        Some(secs) => {
            info!("Running for {}s", secs);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                result = tokio::signal::ctrl_c() => result?,
            }
        }
        None => {
            info!("Simulation is running. Press Ctrl+C to stop.");
            tokio::signal::ctrl_c().await?;
        }
    }

    // Graceful shutdown
    info!("Initiating graceful shutdown...");
    if let Some(view) = simulation.shutdown().await {
        let json = serde_json::to_string(&view).context("Failed to encode final view")?;
        info!(view = %json, "Observer's last view");
    }
    info!("Shutdown complete");

    Ok(())
}
