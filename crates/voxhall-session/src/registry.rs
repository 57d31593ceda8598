//! The client registry: tracks every peer the relay has seen.

use std::collections::HashMap;
use std::net::SocketAddr;

use rand::Rng;
use voxhall_protocol::ClientId;

use crate::Client;

/// Authoritative map from client id to [`Client`] record.
///
/// Registration is the only way ids come into existence, and it is
/// observable to the rest of the relay only through later lookups — no
/// broadcast happens on registration. Removal is idempotent: the relay's
/// semantics are best-effort, so "remove someone who is already gone" is
/// a no-op, not an error.
pub struct ClientRegistry {
    clients: HashMap<ClientId, Client>,
}

impl ClientRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Allocates a fresh unique id and creates a record bound to `address`
    /// with no room membership.
    pub fn register(&mut self, address: SocketAddr) -> ClientId {
        let id = self.fresh_id();
        self.clients
            .insert(id.clone(), Client::new(id.clone(), address));
        tracing::info!(client_id = %id, %address, "client registered");
        id
    }

    /// Looks up a client by id.
    pub fn lookup(&self, id: &ClientId) -> Option<&Client> {
        self.clients.get(id)
    }

    /// Looks up a client by id, mutably.
    pub fn lookup_mut(&mut self, id: &ClientId) -> Option<&mut Client> {
        self.clients.get_mut(id)
    }

    /// True if `id` belongs to a live client.
    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    /// Rebinds a client's reachable address to the source of its most
    /// recent datagram. No-op for unknown ids.
    pub fn rebind_address(&mut self, id: &ClientId, address: SocketAddr) {
        if let Some(client) = self.clients.get_mut(id) {
            if client.address != address {
                tracing::debug!(
                    client_id = %id,
                    old = %client.address,
                    new = %address,
                    "client address rebound"
                );
                client.address = address;
            }
        }
    }

    /// Removes a client record, returning it if it existed.
    ///
    /// This is the low-level half of unregistration: it does NOT run the
    /// room leave protocol. The relay state layer, which holds both this
    /// registry and the room directory under one lock, leaves the room
    /// first and then calls this.
    pub fn remove(&mut self, id: &ClientId) -> Option<Client> {
        let removed = self.clients.remove(id);
        if removed.is_some() {
            tracing::info!(client_id = %id, "client unregistered");
        }
        removed
    }

    /// Returns the number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Removes every record. Used on relay shutdown so a restart starts
    /// from a clean slate.
    pub fn clear(&mut self) {
        self.clients.clear();
    }

    /// Draws `client_NNNNNN` ids until one misses every live id. With a
    /// six-digit suffix space and relay-scale populations the first draw
    /// almost always wins, but the check makes collisions impossible
    /// rather than merely unlikely.
    fn fresh_id(&self) -> ClientId {
        let mut rng = rand::rng();
        loop {
            let candidate =
                ClientId(format!("client_{}", rng.random_range(100_000..=999_999)));
            if !self.clients.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
