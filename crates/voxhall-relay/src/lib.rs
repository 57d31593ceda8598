//! # Voxhall relay
//!
//! The rendezvous and relay server for Voxhall voice chat: peers discover
//! each other here, organize into rooms, and exchange session-negotiation
//! messages that the relay forwards without ever reading. Media never
//! touches this process — once two peers have traded offers and
//! candidates through the relay, their audio flows directly between them.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use voxhall_relay::RelayServerBuilder;
//!
//! # async fn run() -> Result<(), voxhall_relay::RelayError> {
//! let server = RelayServerBuilder::new().bind("0.0.0.0:12345").build().await?;
//! let handle = server.spawn();
//! // ... later:
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod router;
mod server;
mod state;

pub use error::RelayError;
pub use server::{RelayHandle, RelayServer, RelayServerBuilder, DEFAULT_PORT};
pub use state::{RelayState, RelayStats};
