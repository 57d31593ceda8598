//! Client identity for the Voxhall signaling relay.
//!
//! The [`ClientRegistry`] is the authoritative mapping from client id to
//! [`Client`] record (reachable address, current room). It is the single
//! source of truth for who a client is; the room directory holds only
//! back-references into it.
//!
//! # Concurrency note
//!
//! `ClientRegistry` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the registry and
//! the room directory are mutated in lockstep (join/leave touch both), so
//! the relay guards them together behind one mutex. Locking here too would
//! only hide that requirement.

mod client;
mod registry;

pub use client::Client;
pub use registry::ClientRegistry;
