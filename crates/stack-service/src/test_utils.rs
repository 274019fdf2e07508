//! Test utilities for the stack service.
//!
//! Deterministic clocks and in-memory streams. Enable with the `test-utils`
//! feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use stack_service::test_utils::ManualTimeSource;
//! use stack_service::TimeSource;
//! use std::time::Duration;
//!
//! let clock = ManualTimeSource::new(1_000);
//! clock.advance(Duration::from_secs(1));
//! assert_eq!(clock.now().as_millis(), 2_000);
//! ```

use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::Timestamp;
use crate::ports::{Liveness, LivenessCheck, TimeSource};

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    millis: Arc<AtomicU64>,
}

impl ManualTimeSource {
    pub fn new(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.millis.load(Ordering::SeqCst))
    }
}

/// In-memory connection: scripted request bytes in, captured response out.
///
/// Reads past the scripted input report end of stream. The peer can be
/// "disconnected" from another thread through [`MockStream::peer`].
#[derive(Debug)]
pub struct MockStream {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
    alive: Arc<AtomicBool>,
}

/// Handle to observe and control a [`MockStream`] after it was moved.
#[derive(Debug, Clone)]
pub struct MockPeer {
    output: Arc<Mutex<Vec<u8>>>,
    alive: Arc<AtomicBool>,
}

impl MockStream {
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: Cursor::new(input.into()),
            output: Arc::new(Mutex::new(Vec::new())),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn peer(&self) -> MockPeer {
        MockPeer {
            output: Arc::clone(&self.output),
            alive: Arc::clone(&self.alive),
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.output.lock().clone()
    }
}

impl MockPeer {
    pub fn disconnect(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn written(&self) -> Vec<u8> {
        self.output.lock().clone()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer disconnected"));
        }
        self.output.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LivenessCheck for MockStream {
    fn check_liveness(&mut self) -> Liveness {
        if self.alive.load(Ordering::SeqCst) {
            Liveness::Alive
        } else {
            Liveness::Closed
        }
    }
}
