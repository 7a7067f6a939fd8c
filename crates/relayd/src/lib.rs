//! Pulse Relay Daemon - Session registry and broadcast server
//!
//! This crate provides the server side of the pulse relay:
//! - `config` - Layered configuration (defaults, TOML file, CLI overrides)
//! - `registry` - Shared set of live sessions with broadcast fan-out
//! - `router` - Decides which commands are relayed
//! - `server` - TCP listener and per-connection sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       relayd                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │  RelayServer    │────▶│     Registry                │   │
//! │  │ (TcpListener)   │     │  (SessionId → outbox)       │   │
//! │  └────────┬────────┘     └──────────────▲──────────────┘   │
//! │           │                             │                   │
//! │           │ accept                      │ broadcast         │
//! │           ▼                             │                   │
//! │  ┌─────────────────┐     ┌──────────────┴──────────────┐   │
//! │  │    Session      │────▶│         Router              │   │
//! │  │  (per client)   │     │  (pulse_alpha, pulse_beta)  │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod registry;
pub mod router;
pub mod server;
