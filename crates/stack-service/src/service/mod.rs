//! # Service Layer
//!
//! Wires the domain components to connections: the accept loop, the
//! per-connection protocol handler and the shared state they operate on.

mod handler;
mod listener;
mod shutdown;
mod state;


pub use handler::{ConnectionHandler, ConnectionOutcome};
pub use listener::{ServerHandle, StackServer};
pub use shutdown::ShutdownSignal;
pub use state::{ServiceSnapshot, ServiceState};
