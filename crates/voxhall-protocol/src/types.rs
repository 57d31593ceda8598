//! Core wire types for the Voxhall signaling protocol.
//!
//! Everything a peer and the relay exchange is a single JSON object per
//! datagram — the [`Envelope`]. The relay reads only the envelope fields
//! (type, sender, target, room); the `data` payload is opaque and belongs
//! to the negotiation layer running above the relay (SDP blobs, ICE
//! candidate strings, membership snapshots).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a client, assigned by the relay on first contact.
///
/// Opaque to everyone but the relay: clients echo it back verbatim and use
/// it to address unicast messages. `#[serde(transparent)]` keeps the wire
/// form a plain JSON string, e.g. `"client_482913"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// Returns the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identifier, which peers send before they have
    /// been assigned one. The relay treats it the same as a missing id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A room name. Rooms are never pre-declared — a room exists exactly while
/// it has members, so any string a client asks to join is a valid room id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the raw room name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Message type tags
// ---------------------------------------------------------------------------

/// The `type` tag of an envelope.
///
/// `#[serde(rename_all = "snake_case")]` matches the wire spelling
/// (`"join_room"`, `"ice_candidate"`, ...). A tag this relay does not
/// recognize deserializes to [`Unknown`](MessageType::Unknown) via
/// `#[serde(other)]` instead of failing the whole envelope — the router
/// logs and ignores those, which is not the same thing as a malformed
/// datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Client → relay. Carries no request beyond "register me"; any first
    /// message from an unknown sender has the same effect.
    Hello,
    /// Relay → client: your assigned id (in the envelope's `client_id`).
    ClientRegistered,
    /// Client → relay: join the room named in `room_id`.
    JoinRoom,
    /// Client → relay: leave the current room.
    LeaveRoom,
    /// Relay → room members: someone joined (`data.user_id`).
    UserJoined,
    /// Relay → room members: someone left (`data.user_id`).
    UserLeft,
    /// Relay → joiner: current membership snapshot (`data.users`).
    RoomUsers,
    /// Negotiation message, forwarded without interpretation.
    Offer,
    /// Negotiation message, forwarded without interpretation.
    Answer,
    /// Negotiation message, forwarded without interpretation.
    IceCandidate,
    /// Anything else, including a missing `type` field.
    #[serde(other)]
    Unknown,
}

impl MessageType {
    /// The wire spelling of this tag (`"unknown"` for unrecognized input).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::ClientRegistered => "client_registered",
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::UserJoined => "user_joined",
            Self::UserLeft => "user_left",
            Self::RoomUsers => "room_users",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice_candidate",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for MessageType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The wire message. One JSON object per datagram, in both directions.
///
/// Every field except `type` is optional on input; the relay fills in
/// `sender` and `timestamp` on anything it forwards, and never trusts
/// those fields as sent by a client. `data` is carried through untouched.
///
/// ```json
/// { "type": "offer", "client_id": "client_123456",
///   "target": "client_654321", "data": { "sdp": "v=0..." } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message tag. Missing or unrecognized tags decode as
    /// [`MessageType::Unknown`].
    #[serde(rename = "type", default)]
    pub kind: MessageType,

    /// The sender's claimed identity. Absent or empty on a peer's first
    /// message, before the relay has assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,

    /// Room name for `join_room`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,

    /// Recipient id for directed negotiation messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ClientId>,

    /// Opaque payload. The relay never looks inside.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,

    /// Stamped by the relay when forwarding; never trusted from a client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ClientId>,

    /// Unix seconds, stamped by the relay. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Envelope {
    /// Creates a client-originated envelope with just a tag. Fields are
    /// public, so callers fill in whatever the message type needs.
    pub fn request(kind: MessageType) -> Self {
        Self {
            kind,
            client_id: None,
            room_id: None,
            target: None,
            data: Value::Null,
            sender: None,
            timestamp: None,
        }
    }

    /// Creates a relay-originated envelope: tag + payload + fresh
    /// timestamp. `sender` is left unset (notifications from the relay
    /// itself have no sender).
    pub fn server(kind: MessageType, data: Value) -> Self {
        Self {
            kind,
            client_id: None,
            room_id: None,
            target: None,
            data,
            sender: None,
            timestamp: Some(unix_now()),
        }
    }

    /// Creates a forwarded copy of a negotiation message: same tag, same
    /// payload, `sender` stamped to the verified caller identity. The
    /// inbound `target`/`room_id`/`client_id` fields are deliberately not
    /// echoed to the recipient.
    pub fn relayed(kind: MessageType, data: Value, sender: ClientId) -> Self {
        let mut env = Self::server(kind, data);
        env.sender = Some(sender);
        env
    }

    /// The sender identity claimed by this envelope, with the empty string
    /// normalized to `None`.
    pub fn claimed_sender(&self) -> Option<&ClientId> {
        self.client_id.as_ref().filter(|id| !id.is_empty())
    }

    /// The unicast target, with the empty string normalized to `None`.
    pub fn unicast_target(&self) -> Option<&ClientId> {
        self.target.as_ref().filter(|id| !id.is_empty())
    }
}

/// Current time as unix seconds. Falls back to 0 if the clock is set
/// before the epoch, since the timestamp is informational only.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================
