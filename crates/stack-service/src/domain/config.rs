//! Service configuration with validation.
//!
//! Defaults: a 100-message stack, 100
//! concurrent connections, ten-minute staleness and a 30 second idle timeout
//! on port 8080.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use super::errors::ConfigError;

/// Maximum number of messages held by the stack.
pub const STACK_MAX_SIZE: usize = 100;
/// Maximum number of concurrently admitted connections.
pub const CONN_MAX_COUNT: usize = 100;
/// Age after which a waiting connection may be evicted.
pub const STALE_AFTER_SECS: u64 = 10 * 60;
/// Per-socket read/write timeout.
pub const IDLE_TIMEOUT_SECS: u64 = 30;
/// Listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Stack service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080, 0 picks an ephemeral port)
    pub port: u16,
    /// Stack capacity
    pub stack_capacity: usize,
    /// Concurrent connection cap
    pub max_connections: usize,
    /// Minimum wait age (seconds) before a waiter can be evicted
    pub stale_after_secs: u64,
    /// Socket idle timeout (seconds)
    pub idle_timeout_secs: u64,
    /// Upper bound (milliseconds) on one blocking wait before the
    /// connection is checked again. Unset means the idle timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_interval_millis: Option<u64>,
    /// Sleep (milliseconds) between empty accept polls
    pub accept_poll_millis: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            stack_capacity: STACK_MAX_SIZE,
            max_connections: CONN_MAX_COUNT,
            stale_after_secs: STALE_AFTER_SECS,
            idle_timeout_secs: IDLE_TIMEOUT_SECS,
            liveness_interval_millis: None,
            accept_poll_millis: 100,
        }
    }
}

impl ServiceConfig {
    /// Loopback config on an ephemeral port with short waits.
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            idle_timeout_secs: 5,
            liveness_interval_millis: Some(50),
            accept_poll_millis: 10,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_connections == 0 {
            return Err(ConfigError::ZeroConnections);
        }
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("idle_timeout_secs"));
        }
        if self.liveness_interval_millis == Some(0) {
            return Err(ConfigError::ZeroDuration("liveness_interval_millis"));
        }
        if self.accept_poll_millis == 0 {
            return Err(ConfigError::ZeroDuration("accept_poll_millis"));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply `STACK_*` environment overrides.
    ///
    /// Unparseable values are ignored and the current value is kept.
    pub fn with_env_overrides(mut self) -> Self {
        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|v| v.trim().parse().ok())
        }

        if let Some(host) = parsed("STACK_HOST") {
            self.host = host;
        }
        if let Some(port) = parsed("STACK_PORT") {
            self.port = port;
        }
        if let Some(capacity) = parsed("STACK_CAPACITY") {
            self.stack_capacity = capacity;
        }
        if let Some(max) = parsed("STACK_MAX_CONNECTIONS") {
            self.max_connections = max;
        }
        if let Some(secs) = parsed("STACK_STALE_AFTER_SECS") {
            self.stale_after_secs = secs;
        }
        if let Some(secs) = parsed("STACK_IDLE_TIMEOUT_SECS") {
            self.idle_timeout_secs = secs;
        }
        self
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn liveness_interval(&self) -> Duration {
        self.liveness_interval_millis
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.idle_timeout())
    }

    pub fn accept_poll_interval(&self) -> Duration {
        Duration::from_millis(self.accept_poll_millis)
    }
}
