//! # Admission Controller
//!
//! Decides, per incoming connection, whether it proceeds or is answered
//! busy.
//!
//! ## Policy
//!
//! - Below the cap: admit.
//! - At the cap: evict the longest-waiting connection if it has waited at
//!   least the staleness threshold, then admit. The victim receives a busy
//!   reply rather than a silent close.
//! - Otherwise: reject.
//!
//! The active count only exceeds the cap transiently, between an eviction
//! and the moment the evicted handler drops its permit.

mod types;


pub use types::{Admission, AdmissionStats, ConnectionPermit};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::registry::WaitRegistry;
use super::store::LifoStore;

/// Connection-count gatekeeper backed by the wait registry.
#[derive(Debug)]
pub struct AdmissionController {
    active: Arc<AtomicUsize>,
    max_connections: usize,
    stale_after: Duration,
    registry: Arc<WaitRegistry>,
    store: Arc<LifoStore>,
    stats: AdmissionStats,
}

impl AdmissionController {
    pub fn new(
        max_connections: usize,
        stale_after: Duration,
        registry: Arc<WaitRegistry>,
        store: Arc<LifoStore>,
    ) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max_connections,
            stale_after,
            registry,
            store,
            stats: AdmissionStats::default(),
        }
    }

    /// Decide whether a new connection may proceed.
    pub fn admit(&self) -> Admission {
        if let Some(permit) = self.try_acquire() {
            self.stats.accepted.fetch_add(1, Ordering::Relaxed);
            return Admission::Accepted(permit);
        }

        if let Some(victim) = self.registry.oldest_if_stale(self.stale_after) {
            // The victim may be parked on either store condition.
            self.store.wake_all();
            self.stats.evicted.fetch_add(1, Ordering::Relaxed);

            info!(
                victim = %victim.id(),
                kind = %victim.kind(),
                active = self.active(),
                "Evicted stale waiter to admit new connection"
            );

            return Admission::Evicted {
                victim: victim.id(),
                permit: self.force_acquire(),
            };
        }

        self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        debug!(
            active = self.active(),
            max = self.max_connections,
            "Connection cap reached, rejecting"
        );
        Admission::Rejected
    }

    /// Number of connections currently holding a permit.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn stats(&self) -> &AdmissionStats {
        &self.stats
    }

    fn try_acquire(&self) -> Option<ConnectionPermit> {
        let mut current = self.active.load(Ordering::Acquire);
        loop {
            if current >= self.max_connections {
                return None;
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(ConnectionPermit::new(Arc::clone(&self.active))),
                Err(observed) => current = observed,
            }
        }
    }

    /// Take a slot regardless of the cap; only used after an eviction.
    fn force_acquire(&self) -> ConnectionPermit {
        self.active.fetch_add(1, Ordering::AcqRel);
        ConnectionPermit::new(Arc::clone(&self.active))
    }
}
