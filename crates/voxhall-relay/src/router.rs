//! Per-datagram dispatch: resolve the sender, then route by message type.
//!
//! The routing itself ([`route`]) is synchronous and pure with respect to
//! I/O — it mutates the shared state and returns the addressed envelopes
//! the datagram implies. [`handle_datagram`] wraps it with decode, the
//! state lock, and the actual sends, in that order, so the lock is never
//! held across a socket operation and membership is always snapshotted
//! before anything goes on the wire.

use std::net::SocketAddr;

use serde_json::Value;
use tokio::sync::Mutex;
use voxhall_protocol::{ClientId, Codec, Envelope, JsonCodec, MessageType, RoomId};
use voxhall_room::Delivery;
use voxhall_transport::UdpTransport;

use crate::state::RelayState;

/// Room joined when a `join_room` names none.
const DEFAULT_ROOM: &str = "default";

/// Decodes one datagram, routes it, and sends whatever came out.
///
/// Malformed datagrams are dropped with a log line and no reply; send
/// failures are logged and otherwise ignored. Nothing in here can take
/// the receive loop down.
pub(crate) async fn handle_datagram(
    state: &Mutex<RelayState>,
    transport: &UdpTransport,
    codec: &JsonCodec,
    payload: &[u8],
    from: SocketAddr,
) {
    let envelope: Envelope = match codec.decode(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(%from, error = %e, "dropping malformed datagram");
            return;
        }
    };

    let outbound = {
        let mut state = state.lock().await;
        route(&mut state, envelope, from)
    };

    for (addr, envelope) in outbound {
        let bytes = match codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode outbound envelope");
                continue;
            }
        };
        if let Err(e) = transport.send_to(&bytes, addr).await {
            tracing::warn!(%addr, error = %e, "send failed, dropping message");
        }
    }
}

/// Routes one decoded envelope. Returns the datagrams to send, already
/// resolved to addresses.
///
/// Stage 1 resolves the sender identity: an unknown or missing
/// `client_id` means a fresh client — register it and queue a
/// `client_registered` reply — and a known id has its address rebound to
/// the datagram's source. Stage 2 is the type switch, which then works
/// with a verified id only.
pub(crate) fn route(
    state: &mut RelayState,
    envelope: Envelope,
    from: SocketAddr,
) -> Vec<(SocketAddr, Envelope)> {
    let mut outbound = Vec::new();

    let sender_id = match envelope.claimed_sender() {
        Some(id) if state.registry.contains(id) => {
            state.registry.rebind_address(id, from);
            id.clone()
        }
        _ => {
            let id = state.registry.register(from);
            let mut registered =
                Envelope::server(MessageType::ClientRegistered, Value::Null);
            registered.client_id = Some(id.clone());
            outbound.push((from, registered));
            id
        }
    };

    match envelope.kind {
        MessageType::JoinRoom => {
            let room_id = envelope
                .room_id
                .unwrap_or_else(|| RoomId::from(DEFAULT_ROOM));
            let deliveries = state.rooms.join(&mut state.registry, &sender_id, room_id);
            outbound.extend(resolve(state, deliveries));
        }

        MessageType::LeaveRoom => {
            let deliveries = state.rooms.leave(&mut state.registry, &sender_id);
            outbound.extend(resolve(state, deliveries));
        }

        MessageType::Offer => match envelope.unicast_target().cloned() {
            Some(target) => {
                outbound.extend(unicast(
                    state,
                    MessageType::Offer,
                    envelope.data,
                    sender_id,
                    target,
                ));
            }
            // An offer with no target fans out to the sender's room.
            None => {
                outbound.extend(broadcast_to_room(
                    state,
                    MessageType::Offer,
                    envelope.data,
                    sender_id,
                ));
            }
        },

        // Answers and candidates are point-to-point by design: without a
        // target there is nobody they could meaningfully reach.
        MessageType::Answer | MessageType::IceCandidate => {
            match envelope.unicast_target().cloned() {
                Some(target) => {
                    outbound.extend(unicast(
                        state,
                        envelope.kind,
                        envelope.data,
                        sender_id,
                        target,
                    ));
                }
                None => {
                    tracing::debug!(
                        client_id = %sender_id,
                        kind = %envelope.kind,
                        "dropping untargeted point-to-point message"
                    );
                }
            }
        }

        // Registration already happened in stage 1.
        MessageType::Hello => {}

        MessageType::ClientRegistered
        | MessageType::UserJoined
        | MessageType::UserLeft
        | MessageType::RoomUsers => {
            tracing::debug!(
                client_id = %sender_id,
                kind = %envelope.kind,
                "ignoring server-only message type from client"
            );
        }

        MessageType::Unknown => {
            tracing::debug!(client_id = %sender_id, "ignoring unknown message type");
        }
    }

    outbound
}

/// Resolves deliveries to socket addresses. A recipient that vanished
/// from the registry is dropped — best-effort, like everything here.
fn resolve(state: &RelayState, deliveries: Vec<Delivery>) -> Vec<(SocketAddr, Envelope)> {
    deliveries
        .into_iter()
        .filter_map(|delivery| match state.registry.lookup(&delivery.to) {
            Some(client) => Some((client.address, delivery.envelope)),
            None => {
                tracing::debug!(
                    client_id = %delivery.to,
                    "dropping notification for unknown client"
                );
                None
            }
        })
        .collect()
}

/// Forwards a negotiation message to one target, sender stamped. An
/// unknown target id drops the message silently (beyond a log line).
fn unicast(
    state: &RelayState,
    kind: MessageType,
    data: Value,
    sender_id: ClientId,
    target: ClientId,
) -> Option<(SocketAddr, Envelope)> {
    match state.registry.lookup(&target) {
        Some(client) => Some((
            client.address,
            Envelope::relayed(kind, data, sender_id),
        )),
        None => {
            tracing::debug!(
                client_id = %sender_id,
                %target,
                kind = %kind,
                "dropping message for unknown target"
            );
            None
        }
    }
}

/// Forwards a negotiation message to every other member of the sender's
/// room. A sender with no room means nothing to do.
fn broadcast_to_room(
    state: &RelayState,
    kind: MessageType,
    data: Value,
    sender_id: ClientId,
) -> Vec<(SocketAddr, Envelope)> {
    let Some(room_id) = state
        .registry
        .lookup(&sender_id)
        .and_then(|client| client.room_id.clone())
    else {
        tracing::debug!(
            client_id = %sender_id,
            kind = %kind,
            "dropping room broadcast from client with no room"
        );
        return Vec::new();
    };

    let targets = state.rooms.broadcast_targets(&room_id, &sender_id);
    let relayed = Envelope::relayed(kind, data, sender_id);
    targets
        .into_iter()
        .filter_map(|target| {
            state
                .registry
                .lookup(&target)
                .map(|client| (client.address, relayed.clone()))
        })
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
