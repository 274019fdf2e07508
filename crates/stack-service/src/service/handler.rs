//! Per-connection protocol state machine.
//!
//! ```text
//! ReadHeader ──► Admission ──► Push ─┐
//!                    │        Pop  ──┼──► Responding ──► Closed
//!                    └──► Rejected ──┘
//! ```
//!
//! A connection carries exactly one request. Waiting for room (push) or for
//! a message (pop) happens in bounded slices of the liveness interval; between
//! slices the handler checks the eviction flag, the shutdown flag and
//! whether the peer is still there.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use stack_telemetry::{
    time_histogram, ACTIVE_CONNECTIONS, CONNECTIONS_ABORTED, CONNECTIONS_EVICTED,
    CONNECTIONS_REJECTED, MESSAGES_POPPED, MESSAGES_PUSHED, STACK_SIZE, WAIT_DURATION,
};
use tracing::{debug, warn};

use super::state::ServiceState;
use crate::domain::{Admission, Message, RegistrationGuard, StackError, WaitKind};
use crate::ports::{Liveness, LivenessCheck};
use crate::protocol::{Request, Response};

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Message of `len` bytes stored, `0x00` sent
    Pushed { len: u8 },
    /// Message of `len` bytes handed out
    Popped { len: u8 },
    /// Connection cap reached with no stale waiter, `0xFF` sent
    Rejected,
    /// Waited too long and was displaced by a newer connection, `0xFF` sent
    Evicted,
    /// Peer went away while waiting
    Disconnected,
    /// Server stopped while waiting
    ShuttingDown,
    /// Peer closed before sending a header
    Closed,
    /// I/O error or short read
    Failed,
}

impl ConnectionOutcome {
    /// Label used for the aborted-connections metric.
    fn abort_reason(&self) -> Option<&'static str> {
        match self {
            Self::Disconnected => Some("disconnected"),
            Self::ShuttingDown => Some("shutdown"),
            Self::Failed => Some("io"),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pushed { len } => write!(f, "pushed({len})"),
            Self::Popped { len } => write!(f, "popped({len})"),
            Self::Rejected => write!(f, "rejected"),
            Self::Evicted => write!(f, "evicted"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::ShuttingDown => write!(f, "shutting-down"),
            Self::Closed => write!(f, "closed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Serves one request on one stream.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    state: Arc<ServiceState>,
}

impl ConnectionHandler {
    pub fn new(state: Arc<ServiceState>) -> Self {
        Self { state }
    }

    /// Run the connection to completion. Never fails: errors become
    /// [`ConnectionOutcome::Failed`] after being logged.
    pub fn handle<S>(&self, stream: &mut S) -> ConnectionOutcome
    where
        S: Read + Write + LivenessCheck,
    {
        let outcome = match self.serve(stream) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Connection failed");
                ConnectionOutcome::Failed
            }
        };
        self.record(outcome);
        outcome
    }

    fn serve<S>(&self, stream: &mut S) -> Result<ConnectionOutcome, StackError>
    where
        S: Read + Write + LivenessCheck,
    {
        let Some(header) = read_header(stream)? else {
            return Ok(ConnectionOutcome::Closed);
        };
        let request = Request::decode(header);

        let _permit = match self.state.admission().admit() {
            Admission::Accepted(permit) => permit,
            Admission::Evicted { victim, permit } => {
                debug!(%victim, request = request.name(), "Admitted after eviction");
                permit
            }
            Admission::Rejected => return self.reject(stream, request),
        };
        ACTIVE_CONNECTIONS.set(self.state.admission().active() as f64);

        match request {
            Request::Push { len } => self.push(stream, len),
            Request::Pop => self.pop(stream),
        }
    }

    fn reject<S>(&self, stream: &mut S, request: Request) -> Result<ConnectionOutcome, StackError>
    where
        S: Read + Write,
    {
        let _entry = self.state.registry().register(WaitKind::Rejected);
        if let Request::Push { len } = request {
            // Unread payload would turn our close into a reset.
            match io::copy(&mut (&mut *stream).take(u64::from(len)), &mut io::sink()) {
                Ok(drained) if drained == u64::from(len) => {}
                Ok(drained) => {
                    debug!(drained, expected = len, "Rejected push ended mid-payload");
                    return Ok(ConnectionOutcome::Rejected);
                }
                Err(e) => {
                    debug!(error = %e, "Failed to drain rejected push payload");
                    return Ok(ConnectionOutcome::Rejected);
                }
            }
        }
        Response::Busy.write_to(stream)?;
        Ok(ConnectionOutcome::Rejected)
    }

    fn push<S>(&self, stream: &mut S, len: u8) -> Result<ConnectionOutcome, StackError>
    where
        S: Read + Write + LivenessCheck,
    {
        let mut payload = vec![0u8; usize::from(len)];
        stream.read_exact(&mut payload)?;
        let mut message = Message::new(payload)?;

        let store = self.state.store();
        let shutdown = self.state.shutdown_signal();
        let entry = self.state.registry().register(WaitKind::Push);
        let _timer = time_histogram!(WAIT_DURATION);

        loop {
            if let Some(outcome) = self.interruption(stream, &entry, || store.is_full())? {
                return Ok(outcome);
            }
            match store.push_within(message, self.state.liveness_interval(), || {
                entry.is_evicted() || shutdown.is_triggered()
            }) {
                Ok(()) => break,
                Err(back) => {
                    message = back;
                    debug!(id = %entry.id(), size = store.len(), "Push still waiting for room");
                }
            }
        }

        drop(entry);
        Response::Ack.write_to(stream)?;
        Ok(ConnectionOutcome::Pushed { len })
    }

    fn pop<S>(&self, stream: &mut S) -> Result<ConnectionOutcome, StackError>
    where
        S: Read + Write + LivenessCheck,
    {
        let store = self.state.store();
        let shutdown = self.state.shutdown_signal();
        let entry = self.state.registry().register(WaitKind::Pop);
        let _timer = time_histogram!(WAIT_DURATION);

        let message = loop {
            if let Some(outcome) = self.interruption(stream, &entry, || store.is_empty())? {
                return Ok(outcome);
            }
            if let Some(message) = store.pop_within(self.state.liveness_interval(), || {
                entry.is_evicted() || shutdown.is_triggered()
            }) {
                break message;
            }
            debug!(id = %entry.id(), "Pop still waiting for a message");
        };

        drop(entry);
        let len = message.len();
        Response::Popped(message).write_to(stream)?;
        Ok(ConnectionOutcome::Popped { len })
    }

    /// Checks run between wait slices. `blocked` reports whether the next
    /// store attempt would have to wait; only then is the peer checked.
    fn interruption<S, F>(
        &self,
        stream: &mut S,
        entry: &RegistrationGuard,
        blocked: F,
    ) -> Result<Option<ConnectionOutcome>, StackError>
    where
        S: Write + LivenessCheck,
        F: Fn() -> bool,
    {
        if entry.is_evicted() {
            Response::Busy.write_to(stream)?;
            return Ok(Some(ConnectionOutcome::Evicted));
        }
        if self.state.shutdown_signal().is_triggered() {
            return Ok(Some(ConnectionOutcome::ShuttingDown));
        }
        if blocked() && stream.check_liveness() == Liveness::Closed {
            debug!(id = %entry.id(), kind = %entry.connection().kind(), "Peer gone while waiting");
            return Ok(Some(ConnectionOutcome::Disconnected));
        }
        Ok(None)
    }

    fn record(&self, outcome: ConnectionOutcome) {
        match outcome {
            ConnectionOutcome::Pushed { .. } => MESSAGES_PUSHED.inc(),
            ConnectionOutcome::Popped { .. } => MESSAGES_POPPED.inc(),
            ConnectionOutcome::Rejected => CONNECTIONS_REJECTED.inc(),
            ConnectionOutcome::Evicted => CONNECTIONS_EVICTED.inc(),
            _ => {}
        }
        if let Some(reason) = outcome.abort_reason() {
            CONNECTIONS_ABORTED.with_label_values(&[reason]).inc();
        }
        STACK_SIZE.set(self.state.store().len() as f64);
        ACTIVE_CONNECTIONS.set(self.state.admission().active() as f64);
    }
}

/// Read the single header byte. `None` means the peer closed first.
fn read_header<R: Read>(stream: &mut R) -> io::Result<Option<u8>> {
    let mut header = [0u8; 1];
    loop {
        match stream.read(&mut header) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(header[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
