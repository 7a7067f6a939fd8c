//! Relay Core - Shared types for the pulse relay
//!
//! This crate provides the domain types shared between the wire
//! protocol (relay-protocol) and the server (relayd).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod command;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use command::{Command, DELIMITER};
pub use error::{CommandError, CoreResult};
pub use session::{PeerInfo, SessionId, SessionState};
