//! Adapters binding the ports to real sockets, plus the client side.

mod client;
mod tcp;

pub use client::{PopReply, PushReply, StackClient};
