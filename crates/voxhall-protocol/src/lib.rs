//! Wire protocol for the Voxhall signaling relay.
//!
//! This crate defines the "language" that peers and the relay speak:
//!
//! - **Types** ([`Envelope`], [`MessageType`], [`ClientId`], [`RoomId`]) —
//!   the one-object-per-datagram wire format.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how envelopes are
//!   converted to/from datagram payloads.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing that.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw datagrams) and the
//! router (client identity, rooms). It knows nothing about addresses or
//! membership — only how to read and write envelopes.
//!
//! ```text
//! Transport (datagrams) → Protocol (Envelope) → Router (registry/rooms)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientId, Envelope, MessageType, RoomId};
