//! Shared relay state: the registry and the room directory, together.

use voxhall_protocol::ClientId;
use voxhall_room::{Delivery, RoomDirectory};
use voxhall_session::ClientRegistry;

/// The one mutual-exclusion domain of the relay.
///
/// Join and leave mutate the registry (`Client::room_id`) and the
/// directory (member sets) in lockstep; guarding them separately would
/// let another task observe a client marked as in a room whose member
/// set doesn't list it. So the server wraps ONE `Mutex<RelayState>`
/// around both maps and every operation runs to completion under it.
pub struct RelayState {
    /// Who each client is and where to reach them.
    pub registry: ClientRegistry,
    /// Which clients share which broadcast scopes.
    pub rooms: RoomDirectory,
}

/// Point-in-time counters, for the periodic health log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Registered clients.
    pub clients: usize,
    /// Live (non-empty) rooms.
    pub rooms: usize,
}

impl RelayState {
    /// Creates empty state.
    pub fn new() -> Self {
        Self {
            registry: ClientRegistry::new(),
            rooms: RoomDirectory::new(),
        }
    }

    /// Removes a client entirely: runs the room leave protocol first so
    /// membership and `user_left` notifications stay consistent, then
    /// drops the registry record. Idempotent — an unknown id is a no-op
    /// that returns no deliveries.
    pub fn unregister(&mut self, client_id: &ClientId) -> Vec<Delivery> {
        let deliveries = self.rooms.leave(&mut self.registry, client_id);
        self.registry.remove(client_id);
        deliveries
    }

    /// Current counters.
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            clients: self.registry.len(),
            rooms: self.rooms.room_count(),
        }
    }

    /// Drops every client and room. Runs on shutdown, under the lock, so
    /// a restart or process exit leaves no stale state behind.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.rooms.clear();
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxhall_protocol::MessageType;

    fn addr(port: u16) -> std::net::SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn test_unregister_runs_leave_protocol_first() {
        let mut state = RelayState::new();
        let a = state.registry.register(addr(4000));
        let b = state.registry.register(addr(4001));
        state.rooms.join(&mut state.registry, &a, "alpha".into());
        state.rooms.join(&mut state.registry, &b, "alpha".into());

        let deliveries = state.unregister(&a);

        assert!(state.registry.lookup(&a).is_none());
        assert!(!state.rooms.members(&"alpha".into()).unwrap().contains(&a));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].to, b);
        assert_eq!(deliveries[0].envelope.kind, MessageType::UserLeft);
    }

    #[test]
    fn test_unregister_unknown_id_is_noop() {
        let mut state = RelayState::new();
        let deliveries = state.unregister(&"client_000000".into());
        assert!(deliveries.is_empty());
        assert_eq!(state.stats(), RelayStats { clients: 0, rooms: 0 });
    }

    #[test]
    fn test_unregister_last_member_deletes_room() {
        let mut state = RelayState::new();
        let a = state.registry.register(addr(4000));
        state.rooms.join(&mut state.registry, &a, "alpha".into());

        let deliveries = state.unregister(&a);

        assert!(deliveries.is_empty());
        assert_eq!(state.stats(), RelayStats { clients: 0, rooms: 0 });
    }

    #[test]
    fn test_clear_empties_both_maps() {
        let mut state = RelayState::new();
        let a = state.registry.register(addr(4000));
        state.rooms.join(&mut state.registry, &a, "alpha".into());

        state.clear();
        assert_eq!(state.stats(), RelayStats { clients: 0, rooms: 0 });
    }
}
