//! Shared fixtures for the socket-level suites.

pub mod admission;
pub mod backpressure;
pub mod scenarios;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use stack_service::test_utils::ManualTimeSource;
use stack_service::{ServerHandle, ServiceConfig, StackClient, StackServer};

/// Upper bound for any single wait in these tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawn a server on an ephemeral localhost port.
pub fn start(config: ServiceConfig) -> ServerHandle {
    StackServer::bind(config)
        .and_then(StackServer::spawn)
        .expect("server should start")
}

/// Spawn a server whose wait registry reads the given clock.
pub fn start_with_clock(config: ServiceConfig, clock: &ManualTimeSource) -> ServerHandle {
    StackServer::with_time_source(config, Arc::new(clock.clone()))
        .and_then(StackServer::spawn)
        .expect("server should start")
}

pub fn client(server: &ServerHandle) -> StackClient {
    StackClient::new(server.local_addr()).with_timeout(TEST_TIMEOUT)
}

/// Poll `cond` until it holds or [`TEST_TIMEOUT`] passes.
pub fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + TEST_TIMEOUT;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Block until `n` connections are parked in the wait registry.
pub fn wait_for_waiters(server: &ServerHandle, n: usize) {
    wait_until(&format!("{n} waiter(s)"), || server.snapshot().waiting == n);
}
