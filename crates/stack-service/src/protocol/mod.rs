//! 1-byte framed request/response protocol.

pub mod frame;

pub use frame::{encode_push, Request, Response, ACK, BUSY, LENGTH_MASK, POP_FLAG};
