//! Blocking client for the stack protocol.
//!
//! One request per connection, mirroring the server. The asymmetric replies
//! are decoded into [`PushReply`] and [`PopReply`].

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::domain::{Message, StackError, MAX_PAYLOAD_LEN};
use crate::protocol::{encode_push, ACK, BUSY, POP_FLAG};

/// Reply to a push request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushReply {
    Accepted,
    Busy,
}

/// Reply to a pop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopReply {
    Message(Message),
    Busy,
}

impl PopReply {
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Busy => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackClient {
    addr: SocketAddr,
    timeout: Option<Duration>,
}

impl StackClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: None,
        }
    }

    /// Bound connect, read and write. Without it a pop on an empty store
    /// blocks until something is pushed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn push(&self, payload: &[u8]) -> Result<PushReply, StackError> {
        let message = Message::new(payload.to_vec())?;
        let mut stream = self.connect()?;
        stream.write_all(&encode_push(&message))?;
        stream.flush()?;

        match read_byte(&mut stream)? {
            ACK => Ok(PushReply::Accepted),
            BUSY => Ok(PushReply::Busy),
            byte => Err(StackError::MalformedResponse { byte }),
        }
    }

    pub fn pop(&self) -> Result<PopReply, StackError> {
        let mut stream = self.connect()?;
        stream.write_all(&[POP_FLAG])?;
        stream.flush()?;

        match read_byte(&mut stream)? {
            BUSY => Ok(PopReply::Busy),
            len if usize::from(len) <= MAX_PAYLOAD_LEN => {
                let mut payload = vec![0u8; usize::from(len)];
                stream.read_exact(&mut payload)?;
                Ok(PopReply::Message(Message::new(payload)?))
            }
            byte => Err(StackError::MalformedResponse { byte }),
        }
    }

    /// Open a raw connection with this client's timeouts applied.
    pub fn connect(&self) -> Result<TcpStream, StackError> {
        let stream = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&self.addr, timeout)?,
            None => TcpStream::connect(self.addr)?,
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

fn read_byte(stream: &mut TcpStream) -> Result<u8, StackError> {
    let mut byte = [0u8; 1];
    stream.read_exact(&mut byte)?;
    Ok(byte[0])
}
