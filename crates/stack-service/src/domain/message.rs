//! Stack payloads.

use super::errors::StackError;

/// Largest payload that fits in the 7 length bits of a push header.
pub const MAX_PAYLOAD_LEN: usize = 0x7F;

/// An immutable byte payload of 0 to 127 bytes.
///
/// Owned by the store once pushed; a pop moves it to the popping connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Box<[u8]>,
}

impl Message {
    /// Create a message, rejecting payloads longer than [`MAX_PAYLOAD_LEN`].
    pub fn new(payload: impl Into<Vec<u8>>) -> Result<Self, StackError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(StackError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self {
            payload: payload.into_boxed_slice(),
        })
    }

    /// Payload length; always fits in 7 bits.
    pub fn len(&self) -> u8 {
        // Bounded by MAX_PAYLOAD_LEN at construction.
        self.payload.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload.into_vec()
    }
}
