//! Transport layer for the Voxhall signaling relay.
//!
//! The protocol is connectionless: one UDP socket, one envelope per
//! datagram, no handshake and no per-peer stream state. That makes the
//! transport surface deliberately small — [`UdpTransport`] wraps a bound
//! socket with receive/send primitives, and everything above it addresses
//! peers by `SocketAddr`.

mod error;
mod udp;

pub use error::TransportError;
pub use udp::UdpTransport;

/// Largest datagram the relay will receive, in bytes.
///
/// Signaling messages are small (an SDP offer is the biggest, a few KiB);
/// anything larger is truncated by the socket read and then rejected by
/// the decoder like any other malformed datagram.
pub const MAX_DATAGRAM_LEN: usize = 4096;
