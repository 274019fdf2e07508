//! Admission decision types.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::ConnectionId;

/// Result of asking the controller to admit a new connection
#[derive(Debug)]
pub enum Admission {
    /// A slot was free
    Accepted(ConnectionPermit),
    /// The cap was reached; a stale waiter was evicted to make room
    Evicted {
        victim: ConnectionId,
        permit: ConnectionPermit,
    },
    /// The cap was reached and no waiter was stale
    Rejected,
}

impl Admission {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// The slot held by an admitted connection.
    pub fn into_permit(self) -> Option<ConnectionPermit> {
        match self {
            Self::Accepted(permit) | Self::Evicted { permit, .. } => Some(permit),
            Self::Rejected => None,
        }
    }
}

/// An admission slot. Dropping it frees the slot.
pub struct ConnectionPermit {
    active: Arc<AtomicUsize>,
}

impl ConnectionPermit {
    pub(super) fn new(active: Arc<AtomicUsize>) -> Self {
        Self { active }
    }
}

impl fmt::Debug for ConnectionPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPermit")
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Admission statistics.
#[derive(Debug, Default)]
pub struct AdmissionStats {
    /// Connections admitted into a free slot
    pub accepted: AtomicU64,
    /// Connections admitted after evicting a stale waiter
    pub evicted: AtomicU64,
    /// Connections refused with the busy byte
    pub rejected: AtomicU64,
}
