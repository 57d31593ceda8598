//! Room membership for the Voxhall signaling relay.
//!
//! A room is nothing but a named broadcast scope: a lazily-created,
//! lazily-destroyed set of client ids. The [`RoomDirectory`] owns those
//! sets and keeps them consistent with the client registry's
//! `Client::room_id` back-references — every mutation here takes
//! `&mut ClientRegistry` so the two can never drift apart.
//!
//! Directory operations perform no I/O. Join and leave return the
//! [`Delivery`] list (addressed notification envelopes) they imply, and
//! the caller sends them after releasing the state lock. That keeps this
//! crate synchronous and trivially testable, and means membership is
//! always snapshotted before anything goes on the wire.

mod delivery;
mod directory;

pub use delivery::Delivery;
pub use directory::RoomDirectory;
