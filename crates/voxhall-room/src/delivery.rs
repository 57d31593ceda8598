//! Outbound message produced by a state operation.

use voxhall_protocol::{ClientId, Envelope};

/// An envelope addressed to one client, waiting to be sent.
///
/// State operations (join, leave, unregister, relay dispatch) return these
/// instead of touching the socket; the relay resolves each `to` against
/// the registry and sends them once the state lock is released.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Recipient client id.
    pub to: ClientId,
    /// The message to send.
    pub envelope: Envelope,
}

impl Delivery {
    /// Creates a delivery.
    pub fn new(to: ClientId, envelope: Envelope) -> Self {
        Self { to, envelope }
    }
}
