//! UDP endpoint implementation using `tokio::net::UdpSocket`.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::TransportError;

/// A bound UDP endpoint.
///
/// All relay traffic — inbound requests, replies, and forwarded
/// negotiation messages — flows through this one socket. `&self` methods
/// only, so the receive loop and any control-side sender can share it
/// behind an `Arc` without locking.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a new UDP endpoint to the given address.
    ///
    /// # Errors
    /// Returns [`TransportError::BindFailed`] if the address is invalid or
    /// the port is taken. This is the fatal-at-startup case.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "UDP transport bound");
        Ok(Self { socket })
    }

    /// Returns the local address the socket is bound to.
    ///
    /// Useful with port 0, where the OS picks a free port.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for the next datagram, filling `buf`.
    ///
    /// Returns the payload length and the sender's address. Datagrams
    /// larger than `buf` are silently truncated by the socket, which the
    /// decoder upstream then rejects.
    pub async fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> Result<(usize, SocketAddr), TransportError> {
        self.socket
            .recv_from(buf)
            .await
            .map_err(TransportError::ReceiveFailed)
    }

    /// Sends one datagram to `addr`. Fire-and-forget: a returned `Ok`
    /// means the datagram was handed to the OS, not that it arrived.
    pub async fn send_to(
        &self,
        data: &[u8],
        addr: SocketAddr,
    ) -> Result<(), TransportError> {
        self.socket
            .send_to(data, addr)
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }
}
