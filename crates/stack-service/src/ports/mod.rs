//! Ports layer - trait definitions for external dependencies.

pub mod outbound;

pub use outbound::{Liveness, LivenessCheck, SystemTimeSource, TimeSource};
