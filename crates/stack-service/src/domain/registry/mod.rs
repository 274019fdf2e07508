//! # Wait Registry
//!
//! Age-ordered set of in-flight connections, used by the admission
//! controller to pick an eviction victim under connection pressure.
//!
//! ## Ordering
//!
//! Entries are keyed by `(created_at, id)`. The first key is always the
//! longest-waiting connection, so eviction is oldest-first and ties between
//! equal timestamps go to the earlier registration.

mod entry;


pub use entry::{RegistrationGuard, WaitingConnection};

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::{ConnectionId, Timestamp, WaitKind};
use crate::ports::TimeSource;

/// Statistics for the wait registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total connections registered
    pub total_registered: AtomicU64,
    /// Total connections unregistered by their own handler
    pub total_completed: AtomicU64,
    /// Total connections removed by eviction
    pub total_evicted: AtomicU64,
}

/// Age-ordered registry of waiting connections.
pub struct WaitRegistry {
    entries: Mutex<BTreeMap<(Timestamp, ConnectionId), WaitingConnection>>,
    next_id: AtomicU64,
    time_source: Arc<dyn TimeSource>,
    stats: RegistryStats,
}

impl std::fmt::Debug for WaitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitRegistry")
            .field("len", &self.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl WaitRegistry {
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            time_source,
            stats: RegistryStats::default(),
        }
    }

    /// Register a connection stamped with the current time.
    pub fn register(self: &Arc<Self>, kind: WaitKind) -> RegistrationGuard {
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = WaitingConnection::new(id, self.time_source.now(), kind);

        self.entries.lock().insert(entry.key(), entry.clone());
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(connection = %id, kind = %kind, "Registered waiting connection");

        RegistrationGuard::new(Arc::clone(self), entry)
    }

    /// Remove a connection. Returns false if it was not registered, which
    /// happens when it has already been evicted.
    pub fn unregister(&self, connection: &WaitingConnection) -> bool {
        let removed = self.entries.lock().remove(&connection.key()).is_some();
        if removed {
            self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Oldest registered connection, without removing it.
    pub fn peek_oldest(&self) -> Option<WaitingConnection> {
        self.entries
            .lock()
            .first_key_value()
            .map(|(_, entry)| entry.clone())
    }

    /// Remove and return the oldest slot-holding connection if it has waited
    /// at least `threshold`. The returned entry is marked evicted.
    ///
    /// Rejected connections hold no admission slot, so evicting one would
    /// free nothing; they are skipped. Only the oldest remaining candidate
    /// is considered: if it is not stale, nothing is.
    pub fn oldest_if_stale(&self, threshold: Duration) -> Option<WaitingConnection> {
        let now = self.time_source.now();
        let mut entries = self.entries.lock();

        let (key, age) = entries
            .iter()
            .find(|(_, entry)| entry.kind().holds_slot())
            .map(|(key, entry)| (*key, entry.age(now)))?;
        if age < threshold {
            return None;
        }

        let victim = entries.remove(&key)?;
        drop(entries);

        victim.mark_evicted();
        self.stats.total_evicted.fetch_add(1, Ordering::Relaxed);

        debug!(
            connection = %victim.id(),
            kind = %victim.kind(),
            age_ms = victim.age(now).as_millis() as u64,
            "Evicted stale waiting connection"
        );

        Some(victim)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}
