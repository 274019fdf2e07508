//! # Stack Node Runtime
//!
//! Process-level wiring for the LIFO stack service.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics (`stack-telemetry`)
//! 2. Load configuration (file named by `STACK_CONFIG`, then env overrides)
//! 3. Bind and spawn the server
//! 4. Wait for Ctrl+C
//! 5. Stop the server and log a final metrics snapshot

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use stack_service::{ServerHandle, ServiceConfig, ServiceSnapshot, StackServer};
use tracing::{debug, info, warn};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "STACK_CONFIG";

/// A running stack server owned by the process.
pub struct StackNode {
    handle: ServerHandle,
}

impl StackNode {
    /// Bind and start serving.
    pub fn start(config: ServiceConfig) -> Result<Self> {
        info!("===========================================");
        info!("  LIFO Stack Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let addr = config.bind_addr();
        let server = StackServer::bind(config)
            .with_context(|| format!("Failed to start stack server on {addr}"))?;
        let handle = server.spawn().context("Failed to spawn accept loop")?;

        info!(addr = %handle.local_addr(), "Stack node is serving");
        Ok(Self { handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        self.handle.snapshot()
    }

    /// Stop accepting and release all waiters.
    pub async fn shutdown(self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        let snapshot = self.handle.snapshot();

        tokio::task::spawn_blocking(move || self.handle.shutdown())
            .await
            .context("Shutdown task panicked")?
            .context("Server did not stop cleanly")?;

        info!(
            stack_size = snapshot.stack_size,
            active = snapshot.active_connections,
            "Shutdown complete"
        );
        Ok(())
    }
}

/// Load configuration from the optional file and the environment.
pub fn load_config() -> Result<ServiceConfig> {
    let config = match std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            ServiceConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            debug!("No {CONFIG_PATH_ENV} set, using defaults");
            ServiceConfig::default()
        }
    };

    let config = config.with_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Log the Prometheus exposition text at debug level.
pub fn log_metrics_snapshot() {
    match stack_telemetry::encode_metrics() {
        Ok(text) => debug!(metrics = %text, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }
}
