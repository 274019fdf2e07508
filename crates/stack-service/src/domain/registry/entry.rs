//! Registry entries and their RAII guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::WaitRegistry;
use crate::domain::{ConnectionId, Timestamp, WaitKind};

/// A connection registered with the [`WaitRegistry`].
///
/// Cloning shares the eviction flag, so the admission controller can evict
/// an entry while the owning handler observes it.
#[derive(Debug, Clone)]
pub struct WaitingConnection {
    id: ConnectionId,
    created_at: Timestamp,
    kind: WaitKind,
    evicted: Arc<AtomicBool>,
}

impl WaitingConnection {
    pub(super) fn new(id: ConnectionId, created_at: Timestamp, kind: WaitKind) -> Self {
        Self {
            id,
            created_at,
            kind,
            evicted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn kind(&self) -> WaitKind {
        self.kind
    }

    /// Wait age as seen at `now`.
    pub fn age(&self, now: Timestamp) -> Duration {
        self.created_at.elapsed_until(now)
    }

    /// Whether admission control evicted this connection.
    pub fn is_evicted(&self) -> bool {
        self.evicted.load(Ordering::Acquire)
    }

    pub(super) fn mark_evicted(&self) {
        self.evicted.store(true, Ordering::Release);
    }

    /// Ordering key: creation time first, registration order second.
    pub(super) fn key(&self) -> (Timestamp, ConnectionId) {
        (self.created_at, self.id)
    }
}

/// Keeps a connection registered until dropped.
///
/// Dropping the guard unregisters the entry; this is a no-op if it was
/// already evicted.
#[derive(Debug)]
pub struct RegistrationGuard {
    registry: Arc<WaitRegistry>,
    entry: WaitingConnection,
}

impl RegistrationGuard {
    pub(super) fn new(registry: Arc<WaitRegistry>, entry: WaitingConnection) -> Self {
        Self { registry, entry }
    }

    pub fn connection(&self) -> &WaitingConnection {
        &self.entry
    }

    pub fn id(&self) -> ConnectionId {
        self.entry.id()
    }

    pub fn is_evicted(&self) -> bool {
        self.entry.is_evicted()
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.entry);
    }
}
