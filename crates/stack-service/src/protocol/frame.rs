//! Wire format.
//!
//! ```text
//! request   push: [0 | L:7] [L payload bytes]
//!           pop:  [1 | unused:7]
//! response  push ok: 0x00
//!           pop ok:  [L] [L payload bytes]
//!           busy:    0xFF
//! ```
//!
//! Push and pop replies are asymmetric: push answers with a status byte,
//! pop answers with a length byte. Because a payload is at most 127 bytes,
//! a pop reply starting with `0xFF` can only mean busy.

use std::io::{self, Write};

use crate::domain::Message;

/// Header bit selecting the pop operation.
pub const POP_FLAG: u8 = 0x80;
/// Header bits carrying the push payload length.
pub const LENGTH_MASK: u8 = 0x7F;
/// Push acknowledgement.
pub const ACK: u8 = 0x00;
/// Admission refused or waiter evicted.
pub const BUSY: u8 = 0xFF;

/// A decoded request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Push followed by `len` payload bytes
    Push { len: u8 },
    /// Pop; no further request bytes
    Pop,
}

impl Request {
    /// Decode a header byte. Every byte is a valid header.
    pub fn decode(header: u8) -> Self {
        if header & POP_FLAG == POP_FLAG {
            Self::Pop
        } else {
            Self::Push {
                len: header & LENGTH_MASK,
            }
        }
    }

    /// Encode as a header byte.
    pub fn header(&self) -> u8 {
        match self {
            Self::Push { len } => len & LENGTH_MASK,
            Self::Pop => POP_FLAG,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::Pop => "pop",
        }
    }
}

/// A complete response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ack,
    Busy,
    Popped(Message),
}

impl Response {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Ack => vec![ACK],
            Self::Busy => vec![BUSY],
            Self::Popped(message) => {
                let mut frame = Vec::with_capacity(1 + message.as_bytes().len());
                frame.push(message.len());
                frame.extend_from_slice(message.as_bytes());
                frame
            }
        }
    }

    /// Write the whole frame and flush.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()
    }
}

/// Encode a full push request: header plus payload.
pub fn encode_push(message: &Message) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + message.as_bytes().len());
    frame.push(Request::Push { len: message.len() }.header());
    frame.extend_from_slice(message.as_bytes());
    frame
}
