//! # LIFO Stack Service
//!
//! A bounded, in-memory LIFO message stack served over TCP with a 1-byte
//! framed protocol, blocking backpressure and connection admission control.
//!
//! ## Purpose
//!
//! Clients push small payloads (up to 127 bytes) and pop the most recently
//! pushed one. A push against a full stack waits for room; a pop against an
//! empty stack waits for a message. When the connection cap is reached, the
//! longest waiter is evicted if it has waited long enough; otherwise the new
//! connection is answered busy.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Size never exceeds capacity | `domain/store.rs` - `push_locked()` |
//! | Last pushed is first popped | `domain/store.rs` - `VecDeque` back |
//! | Active connections bounded by the cap (except during eviction hand-off) | `domain/admission/mod.rs` - `try_acquire()` |
//! | Eviction picks the oldest waiter | `domain/registry/mod.rs` - `BTreeMap` keyed by `(created_at, id)` |
//! | Registry entries and permits released on every exit path | RAII guards |
//!
//! ## Wire Protocol
//!
//! ```text
//! push:  [0 | L:7] [L bytes]  ──►  0x00 | 0xFF
//! pop:   [1 | ---:7]          ──►  [L] [L bytes] | 0xFF
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  service/  - Accept loop, connection handler, shutdown          │
//! │  adapters/ - TcpStream liveness check, StackClient              │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/outbound.rs - TimeSource, LivenessCheck traits           │
//! │  protocol/         - Header decoding, response frames           │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/store.rs     - LifoStore (mutex + two condvars)         │
//! │  domain/registry/    - WaitRegistry, RegistrationGuard          │
//! │  domain/admission/   - AdmissionController, ConnectionPermit    │
//! │  domain/config.rs    - ServiceConfig                            │
//! │  domain/errors.rs    - StackError, ConfigError                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stack_service::{PopReply, ServiceConfig, StackClient, StackServer};
//!
//! let server = StackServer::bind(ServiceConfig::default())?.spawn()?;
//! let client = StackClient::new(server.local_addr());
//! client.push(b"hi")?;
//! assert_eq!(client.pop()?.into_message().unwrap().as_bytes(), b"hi");
//! server.shutdown()?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod protocol;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{PopReply, PushReply, StackClient};
pub use domain::*;
pub use ports::{Liveness, LivenessCheck, SystemTimeSource, TimeSource};
pub use service::{
    ConnectionHandler, ConnectionOutcome, ServerHandle, ServiceSnapshot, ServiceState,
    ShutdownSignal, StackServer,
};
