//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// A `Decode` error on an inbound datagram is never fatal to the relay:
/// the datagram is dropped with a log line and the receive loop moves on.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an envelope into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, a non-object payload, or
    /// a truncated datagram.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
