//! Liveness check for real sockets.

use std::io;
use std::net::TcpStream;

use crate::ports::{Liveness, LivenessCheck};

impl LivenessCheck for TcpStream {
    /// Peek one byte without blocking.
    ///
    /// End of stream or a socket error means the peer is gone. Pending bytes
    /// or nothing to read both count as alive.
    fn check_liveness(&mut self) -> Liveness {
        if self.set_nonblocking(true).is_err() {
            return Liveness::Closed;
        }
        let mut byte = [0u8; 1];
        let peeked = self.peek(&mut byte);
        if self.set_nonblocking(false).is_err() {
            return Liveness::Closed;
        }

        match peeked {
            Ok(0) => Liveness::Closed,
            Ok(_) => Liveness::Alive,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Liveness::Alive,
            Err(_) => Liveness::Closed,
        }
    }
}
