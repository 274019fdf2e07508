//! Outbound ports: the clock and the peer liveness check.

use crate::domain::Timestamp;

/// Abstract interface for time.
///
/// Injected into the wait registry so staleness can be tested without
/// waiting ten minutes.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| Timestamp::new(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)))
            .unwrap_or_default()
    }
}

/// Result of a liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Peer is still connected (or sent extra bytes)
    Alive,
    /// Peer closed or reset the connection
    Closed,
}

/// Non-blocking check that the peer of a waiting connection is still there.
///
/// Must return promptly: it runs between bounded waits on the store.
pub trait LivenessCheck {
    fn check_liveness(&mut self) -> Liveness;
}
