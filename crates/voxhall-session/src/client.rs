//! The per-client record.

use std::net::SocketAddr;

use voxhall_protocol::{ClientId, RoomId};

/// One registered peer.
///
/// Created on the first datagram from an unknown sender, destroyed on
/// unregistration or relay shutdown. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Relay-assigned identity, stable for the client's lifetime.
    pub id: ClientId,

    /// Where replies and forwarded messages are sent. Rebound to the
    /// source address of the most recent datagram carrying this id — the
    /// protocol has no authentication, so the last sender wins.
    pub address: SocketAddr,

    /// Current room, if any. Kept consistent with the room directory's
    /// member sets: `Some(r)` here iff this client is in `r`'s set.
    pub room_id: Option<RoomId>,
}

impl Client {
    /// Creates a fresh record with no room membership.
    pub fn new(id: ClientId, address: SocketAddr) -> Self {
        Self {
            id,
            address,
            room_id: None,
        }
    }
}
