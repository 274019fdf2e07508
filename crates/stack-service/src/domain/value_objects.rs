//! Small value types shared by the store, the registry and admission.

use std::fmt;
use std::time::Duration;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds since the epoch.
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get the underlying milliseconds value.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Time elapsed between `self` and a later `now`.
    ///
    /// Returns zero if the clock went backwards.
    pub fn elapsed_until(&self, now: Timestamp) -> Duration {
        Duration::from_millis(now.0.saturating_sub(self.0))
    }
}

/// Registry-unique identifier of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What a registered connection is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitKind {
    /// Waiting for room on a full stack
    Push,
    /// Waiting for a message on an empty stack
    Pop,
    /// Refused at admission, registered until its busy reply is written
    Rejected,
}

impl WaitKind {
    /// Whether a connection of this kind holds an admission slot and so may
    /// be evicted to make room.
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Push | Self::Pop)
    }
}

impl fmt::Display for WaitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Push => "push",
            Self::Pop => "pop",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
