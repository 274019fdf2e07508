//! Stack service error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced by the stack service and its client.
///
/// Admission rejection is not an error: it is a protocol outcome answered
/// with the busy byte.
#[derive(Debug, Error)]
pub enum StackError {
    /// Socket or stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration failed validation or could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Payload does not fit in the 7-bit length field.
    #[error("Payload of {len} bytes exceeds maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Server answered with a byte that is not valid for the request.
    #[error("Malformed response byte 0x{byte:02x}")]
    MalformedResponse { byte: u8 },

    /// Listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("stack_capacity cannot be 0")]
    ZeroCapacity,

    #[error("max_connections cannot be 0")]
    ZeroConnections,

    #[error("{0} cannot be 0")]
    ZeroDuration(&'static str),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration file {path}: {reason}")]
    Read { path: String, reason: String },
}
