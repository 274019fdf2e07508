//! Domain layer: the store, the wait registry and admission control.

pub mod admission;
pub mod config;
pub mod errors;
pub mod message;
pub mod registry;
pub mod store;
pub mod value_objects;

pub use admission::{Admission, AdmissionController, AdmissionStats, ConnectionPermit};
pub use config::{
    ServiceConfig, CONN_MAX_COUNT, DEFAULT_PORT, IDLE_TIMEOUT_SECS, STACK_MAX_SIZE,
    STALE_AFTER_SECS,
};
pub use errors::{ConfigError, StackError};
pub use message::{Message, MAX_PAYLOAD_LEN};
pub use registry::{RegistrationGuard, RegistryStats, WaitRegistry, WaitingConnection};
pub use store::LifoStore;
pub use value_objects::{ConnectionId, Timestamp, WaitKind};
