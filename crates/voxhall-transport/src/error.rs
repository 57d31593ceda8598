/// Errors that can occur in the transport layer.
///
/// Binding is the only fatal case — a relay that can't claim its port has
/// nothing to do. Send and receive failures in steady state are logged by
/// the caller and otherwise ignored, matching the fire-and-forget nature
/// of the underlying transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the socket failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Sending a datagram failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a datagram failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
