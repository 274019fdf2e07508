//! Shared state handed to every connection handler.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::shutdown::ShutdownSignal;
use crate::domain::{AdmissionController, LifoStore, ServiceConfig, WaitRegistry};
use crate::ports::TimeSource;

/// Point-in-time view of the service, used for the per-connection summary
/// line and by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSnapshot {
    pub stack_size: usize,
    pub active_connections: usize,
    pub waiting: usize,
}

/// Store, wait registry, admission controller and stop flag of one server.
#[derive(Debug)]
pub struct ServiceState {
    store: Arc<LifoStore>,
    registry: Arc<WaitRegistry>,
    admission: AdmissionController,
    shutdown: ShutdownSignal,
    liveness_interval: Duration,
}

impl ServiceState {
    pub fn new(config: &ServiceConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let store = Arc::new(LifoStore::new(config.stack_capacity));
        let registry = Arc::new(WaitRegistry::new(time_source));
        let admission = AdmissionController::new(
            config.max_connections,
            config.stale_after(),
            Arc::clone(&registry),
            Arc::clone(&store),
        );

        Self {
            store,
            registry,
            admission,
            shutdown: ShutdownSignal::new(),
            liveness_interval: config.liveness_interval(),
        }
    }

    pub fn store(&self) -> &Arc<LifoStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<WaitRegistry> {
        &self.registry
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Upper bound on a single store wait between liveness checks.
    pub fn liveness_interval(&self) -> Duration {
        self.liveness_interval
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            stack_size: self.store.len(),
            active_connections: self.admission.active(),
            waiting: self.registry.len(),
        }
    }

    /// Set the stop flag and release every parked waiter so it can observe it.
    pub fn begin_shutdown(&self) {
        if self.shutdown.trigger() {
            let snapshot = self.snapshot();
            info!(
                stack_size = snapshot.stack_size,
                active = snapshot.active_connections,
                waiting = snapshot.waiting,
                "Shutdown requested"
            );
        }
        self.store.wake_all();
    }
}
