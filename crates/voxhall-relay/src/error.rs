//! Unified error type for the relay server.

use voxhall_protocol::ProtocolError;
use voxhall_transport::TransportError;

/// Top-level error that wraps the crate-specific errors.
///
/// Only startup paths surface these to callers; once the receive loop is
/// running, transport and protocol failures are logged and dropped per
/// the fire-and-forget relay semantics. The `#[from]` attributes let `?`
/// convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
