//! TCP accept loop and server lifecycle.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use stack_telemetry::log_connection_event;
use tracing::{info, warn};

use super::handler::ConnectionHandler;
use super::state::{ServiceSnapshot, ServiceState};
use crate::domain::{ServiceConfig, StackError};
use crate::ports::{SystemTimeSource, TimeSource};

/// A bound listener plus the shared service state.
#[derive(Debug)]
pub struct StackServer {
    listener: TcpListener,
    config: ServiceConfig,
    state: Arc<ServiceState>,
}

impl StackServer {
    /// Validate `config` and bind its address.
    pub fn bind(config: ServiceConfig) -> Result<Self, StackError> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Like [`bind`](Self::bind) with an injected clock for the wait registry.
    pub fn with_time_source(
        config: ServiceConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, StackError> {
        config.validate()?;

        let addr = config.bind_addr();
        let listener =
            TcpListener::bind(addr).map_err(|source| StackError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;

        let state = Arc::new(ServiceState::new(&config, time_source));

        info!(
            addr = %listener.local_addr()?,
            capacity = config.stack_capacity,
            max_connections = config.max_connections,
            stale_after_secs = config.stale_after_secs,
            "Stack server bound"
        );

        Ok(Self {
            listener,
            config,
            state,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, StackError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }

    /// Accept connections until the shutdown flag is set.
    pub fn run(&self) -> Result<(), StackError> {
        let shutdown = self.state.shutdown_signal();
        let mut accepted: u64 = 0;

        while !shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    accepted += 1;
                    self.dispatch(stream, peer, accepted);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.config.accept_poll_interval());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    thread::sleep(self.config.accept_poll_interval());
                }
            }
        }

        info!(accepted, "Accept loop stopped");
        Ok(())
    }

    /// Run the accept loop on a background thread.
    pub fn spawn(self) -> Result<ServerHandle, StackError> {
        let local_addr = self.local_addr()?;
        let state = Arc::clone(&self.state);
        let thread = thread::Builder::new()
            .name("stack-accept".into())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            local_addr,
            state,
            thread: Some(thread),
        })
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr, seq: u64) {
        if let Err(e) = self.configure(&stream) {
            log_connection_event!(warn, peer, "Failed to configure socket", error = %e);
            return;
        }

        let handler = ConnectionHandler::new(Arc::clone(&self.state));
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name(format!("stack-conn-{seq}"))
            .spawn(move || {
                let mut stream = stream;
                let outcome = handler.handle(&mut stream);
                let snapshot = state.snapshot();
                log_connection_event!(
                    info,
                    peer,
                    "Connection finished",
                    outcome = %outcome,
                    size = snapshot.stack_size,
                    conns = snapshot.active_connections
                );
            });

        if let Err(e) = spawned {
            log_connection_event!(warn, peer, "Failed to spawn connection thread", error = %e);
        }
    }

    fn configure(&self, stream: &TcpStream) -> io::Result<()> {
        let idle = Some(self.config.idle_timeout());
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(idle)?;
        stream.set_write_timeout(idle)?;
        stream.set_nodelay(true)
    }
}

/// Handle to a server running on its own thread. Dropping it stops the
/// server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    state: Arc<ServiceState>,
    thread: Option<JoinHandle<Result<(), StackError>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &Arc<ServiceState> {
        &self.state
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        self.state.snapshot()
    }

    /// Stop accepting, release all waiters and wait for the accept loop.
    ///
    /// Connection threads are not joined; each notices the flag within one
    /// liveness interval.
    pub fn shutdown(mut self) -> Result<(), StackError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), StackError> {
        self.state.begin_shutdown();
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "accept thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            if let Err(e) = self.stop() {
                warn!(error = %e, "Server did not stop cleanly");
            }
        }
    }
}
