//! Relay Protocol - Wire protocol for the pulse relay
//!
//! Frames are newline-delimited commands: no length prefix, no escaping.
//! This crate provides the frame codec and the well-known command literals
//! exchanged between clients and the relay.

pub mod codec;
pub mod message;

pub use codec::{FrameError, PulseCodec, DEFAULT_MAX_FRAME_LEN};
pub use message::{
    is_pulse, num_players, parse_num_players, PLAYER_CONNECT, PLAYER_DISCONNECT, PULSE_ALPHA,
    PULSE_BETA, PULSE_COMMANDS, QUIT,
};
