//! The room directory: named member sets, kept in lockstep with the
//! client registry.

use std::collections::{HashMap, HashSet};

use serde_json::json;
use voxhall_protocol::{ClientId, Envelope, MessageType, RoomId};
use voxhall_session::ClientRegistry;

use crate::Delivery;

/// Maps each live room to its member set.
///
/// Invariants maintained by `join`/`leave`:
/// - a room exists iff it has at least one member (empty rooms are
///   deleted immediately);
/// - a client is a member of at most one room, the one named by its
///   `Client::room_id`;
/// - both directions stay consistent — no member without a matching
///   `room_id`, no `room_id` without a matching membership.
pub struct RoomDirectory {
    rooms: HashMap<RoomId, HashSet<ClientId>>,
}

impl RoomDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Puts `client_id` into `room_id`, creating the room if needed.
    ///
    /// If the client is currently in a *different* room, the leave
    /// protocol for that room runs first (its `user_left` notifications
    /// are included in the returned deliveries). The returned list then
    /// carries a `user_joined` for every other member and a `room_users`
    /// membership snapshot for the joiner — the only membership
    /// enumeration this protocol has.
    ///
    /// A join for an id the registry doesn't know is a logged no-op;
    /// identity resolution happens before dispatch, so this indicates a
    /// caller bug rather than a client mistake.
    pub fn join(
        &mut self,
        registry: &mut ClientRegistry,
        client_id: &ClientId,
        room_id: RoomId,
    ) -> Vec<Delivery> {
        let mut deliveries = Vec::new();

        let previous = match registry.lookup(client_id) {
            Some(client) => client.room_id.clone(),
            None => {
                tracing::warn!(%client_id, %room_id, "join from unregistered client ignored");
                return deliveries;
            }
        };

        if let Some(previous_room) = previous {
            if previous_room != room_id {
                deliveries.extend(self.leave(registry, client_id));
            }
        }

        let members = self.rooms.entry(room_id.clone()).or_default();
        members.insert(client_id.clone());
        let others: Vec<ClientId> = members
            .iter()
            .filter(|member| *member != client_id)
            .cloned()
            .collect();

        if let Some(client) = registry.lookup_mut(client_id) {
            client.room_id = Some(room_id.clone());
        }

        tracing::info!(
            %client_id,
            %room_id,
            members = others.len() + 1,
            "client joined room"
        );

        let joined = Envelope::server(
            MessageType::UserJoined,
            json!({ "user_id": client_id }),
        );
        for other in &others {
            deliveries.push(Delivery::new(other.clone(), joined.clone()));
        }

        deliveries.push(Delivery::new(
            client_id.clone(),
            Envelope::server(MessageType::RoomUsers, json!({ "users": others })),
        ));

        deliveries
    }

    /// Takes `client_id` out of its current room, if any.
    ///
    /// Deletes the room when the last member leaves; otherwise the
    /// returned deliveries carry one `user_left` per remaining member.
    /// A client with no room is a plain no-op — no fault, no
    /// notification.
    pub fn leave(
        &mut self,
        registry: &mut ClientRegistry,
        client_id: &ClientId,
    ) -> Vec<Delivery> {
        let mut deliveries = Vec::new();

        let Some(room_id) = registry
            .lookup(client_id)
            .and_then(|client| client.room_id.clone())
        else {
            return deliveries;
        };

        match self.rooms.get_mut(&room_id) {
            Some(members) => {
                members.remove(client_id);
                if members.is_empty() {
                    self.rooms.remove(&room_id);
                    tracing::debug!(%room_id, "room deleted, last member left");
                } else {
                    let left = Envelope::server(
                        MessageType::UserLeft,
                        json!({ "user_id": client_id }),
                    );
                    for member in members.iter() {
                        deliveries.push(Delivery::new(member.clone(), left.clone()));
                    }
                }
            }
            None => {
                // Should be unreachable while the invariants hold.
                tracing::warn!(
                    %client_id,
                    %room_id,
                    "client's room missing from directory, clearing stale reference"
                );
            }
        }

        if let Some(client) = registry.lookup_mut(client_id) {
            client.room_id = None;
        }

        tracing::info!(%client_id, %room_id, "client left room");
        deliveries
    }

    /// The member set of `room_id`, if the room exists.
    pub fn members(&self, room_id: &RoomId) -> Option<&HashSet<ClientId>> {
        self.rooms.get(room_id)
    }

    /// A snapshot of `room_id`'s members excluding `except`, for
    /// broadcast fan-out. Empty when the room doesn't exist.
    pub fn broadcast_targets(
        &self,
        room_id: &RoomId,
        except: &ClientId,
    ) -> Vec<ClientId> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|member| *member != except)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Removes every room. Used on relay shutdown, together with
    /// `ClientRegistry::clear`, under the same lock.
    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
