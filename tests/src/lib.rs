//! # LIFO Stack Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Real-socket scenarios against a spawned server
//!     ├── scenarios.rs  # Request/response flows and LIFO order
//!     ├── backpressure.rs # Blocking on full/empty, disconnects, shutdown
//!     └── admission.rs  # Connection cap, rejection, stale eviction
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p stack-tests
//! cargo test -p stack-tests integration::admission::
//!
//! # Benchmarks
//! cargo bench -p stack-tests
//! ```

pub mod integration;
