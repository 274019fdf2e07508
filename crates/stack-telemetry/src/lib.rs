//! # Stack Telemetry
//!
//! Observability for the LIFO stack service.
//!
//! ## Components
//!
//! - **Logging**: `tracing` subscriber with env-driven filtering and optional
//!   JSON output for log shippers.
//! - **Metrics**: Prometheus collectors for store size, connection pressure,
//!   admission outcomes and wait latency.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stack_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STACK_SERVICE_NAME` | `lifo-stack` | Service name attached to log lines |
//! | `STACK_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `STACK_JSON_LOGS` | `false` | Emit JSON instead of human-readable lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACTIVE_CONNECTIONS, CONNECTIONS_ABORTED,
    CONNECTIONS_EVICTED, CONNECTIONS_REJECTED, MESSAGES_POPPED, MESSAGES_PUSHED, STACK_SIZE,
    WAIT_DURATION,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register all metrics.
///
/// The returned guard must be held for the lifetime of the process; dropping
/// it logs a final line so the end of a run is visible in the log stream.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    init_logging(&config)?;
    let metrics = register_metrics()?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
