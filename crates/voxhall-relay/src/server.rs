//! `RelayServer` builder, receive loop, and lifecycle handle.
//!
//! One task owns the receive loop: datagram in → decode → route → zero or
//! more datagrams out, each handled to completion before the next read.
//! The control side (whoever holds the [`RelayHandle`]) can run its own
//! timer-driven work — the binary logs periodic health stats — and stops
//! the relay with [`RelayHandle::stop`], which signals the loop, awaits
//! it, and leaves the shared state cleared.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use voxhall_protocol::JsonCodec;
use voxhall_transport::{UdpTransport, MAX_DATAGRAM_LEN};

use crate::router;
use crate::state::{RelayState, RelayStats};
use crate::RelayError;

/// Default UDP port, matching the deployed voice-chat clients.
pub const DEFAULT_PORT: u16 = 12345;

/// Builder for configuring and binding a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use voxhall_relay::RelayServerBuilder;
///
/// # async fn run() -> Result<(), voxhall_relay::RelayError> {
/// let server = RelayServerBuilder::new().bind("0.0.0.0:12345").build().await?;
/// let handle = server.spawn();
/// # Ok(())
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
}

impl RelayServerBuilder {
    /// Creates a new builder with the default bind address
    /// (`0.0.0.0:12345`).
    pub fn new() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
        }
    }

    /// Sets the address to bind the UDP socket to. Use port 0 to let the
    /// OS pick (handy in tests).
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the socket and builds the server.
    ///
    /// # Errors
    /// Bind failure is the fatal-at-startup case: the error is returned
    /// and no server exists.
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let transport = UdpTransport::bind(&self.bind_addr).await?;
        let local_addr = transport
            .local_addr()
            .map_err(voxhall_transport::TransportError::BindFailed)?;

        Ok(RelayServer {
            transport: Arc::new(transport),
            state: Arc::new(Mutex::new(RelayState::new())),
            codec: JsonCodec,
            local_addr,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound, not-yet-running relay server.
pub struct RelayServer {
    transport: Arc<UdpTransport>,
    state: Arc<Mutex<RelayState>>,
    codec: JsonCodec,
    local_addr: SocketAddr,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the receive loop on a dedicated task and returns the
    /// control handle.
    pub fn spawn(self) -> RelayHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::clone(&self.state);
        let local_addr = self.local_addr;

        let task = tokio::spawn(run_loop(
            self.transport,
            Arc::clone(&state),
            self.codec,
            shutdown_rx,
        ));

        RelayHandle {
            shutdown: shutdown_tx,
            task,
            state,
            local_addr,
        }
    }
}

/// The receive loop. Runs until the shutdown signal fires (or the handle
/// is dropped), then clears the shared state under the lock so nothing
/// stale survives into a restart.
async fn run_loop(
    transport: Arc<UdpTransport>,
    state: Arc<Mutex<RelayState>>,
    codec: JsonCodec,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(addr = %transport.local_addr().map(|a| a.to_string()).unwrap_or_default(), "relay serving");

    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        tokio::select! {
            // Err means the handle was dropped; treat it as stop too.
            _ = shutdown.changed() => break,

            result = transport.recv_from(&mut buf) => match result {
                Ok((len, from)) => {
                    router::handle_datagram(&state, &transport, &codec, &buf[..len], from)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "receive failed");
                }
            }
        }
    }

    state.lock().await.clear();
    tracing::info!("relay stopped");
}

/// Handle to a running relay. Dropping it without calling
/// [`stop`](Self::stop) also shuts the loop down, just without waiting
/// for it.
pub struct RelayHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    state: Arc<Mutex<RelayState>>,
    local_addr: SocketAddr,
}

impl RelayHandle {
    /// Returns the local address the relay is serving on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current client/room counters, for health logging.
    pub async fn stats(&self) -> RelayStats {
        self.state.lock().await.stats()
    }

    /// Removes a client as if it had disconnected: leave-protocol first
    /// (remaining room members get their `user_left`), then the registry
    /// record. Unknown ids are a no-op.
    pub async fn unregister(&self, client_id: &voxhall_protocol::ClientId) {
        // Deliveries are dropped: the departing client is gone and the
        // notifications only concern members it shared a room with, who
        // are told via the next state read. Kept simple because nothing
        // in the protocol triggers unregistration remotely today.
        let _ = self.state.lock().await.unregister(client_id);
    }

    /// Signals the receive loop to stop and waits for it to finish. The
    /// registry and room directory are cleared before this returns.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
