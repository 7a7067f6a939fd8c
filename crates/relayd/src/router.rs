//! Command routing.
//!
//! Every decoded client command passes through [`Router::route`]. Only the
//! two pulse literals fan out; everything else is logged and dropped, and
//! the connection stays open.
//!
//! Lifecycle notifications (`player_connect`, `player_disconnect` and the
//! `num_players <n>` greeting) are synthesized by the server, never
//! accepted from clients, and only when `emit_lifecycle_events` is set.

use std::fmt;

use tracing::{debug, error, warn};

use relay_core::{Command, CommandError, SessionId};
use relay_protocol::{is_pulse, num_players, PLAYER_CONNECT, PLAYER_DISCONNECT};

use crate::registry::Registry;

/// Outcome of routing one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Relayed to `delivered` other sessions
    Broadcast { delivered: usize },
    /// Not a broadcast trigger; logged and ignored
    Unrecognized,
}

/// Server-synthesized session lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Connect,
    Disconnect,
}

impl Lifecycle {
    /// Returns the wire command announced to the other sessions.
    pub fn command(self) -> Result<Command, CommandError> {
        match self {
            Self::Connect => Command::from_static(PLAYER_CONNECT),
            Self::Disconnect => Command::from_static(PLAYER_DISCONNECT),
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "{PLAYER_CONNECT}"),
            Self::Disconnect => write!(f, "{PLAYER_DISCONNECT}"),
        }
    }
}

/// Routes commands from one session into registry broadcasts.
#[derive(Clone)]
pub struct Router {
    registry: Registry,
    emit_lifecycle_events: bool,
}

impl Router {
    /// Creates a router over `registry`.
    pub fn new(registry: Registry, emit_lifecycle_events: bool) -> Self {
        Self {
            registry,
            emit_lifecycle_events,
        }
    }

    /// Returns true if lifecycle notifications are enabled.
    pub fn emits_lifecycle_events(&self) -> bool {
        self.emit_lifecycle_events
    }

    /// Routes a command received from `origin`.
    pub fn route(&self, origin: SessionId, command: &Command) -> Route {
        if !is_pulse(command) {
            warn!(session = %origin, command = %command, "Unknown command received");
            return Route::Unrecognized;
        }

        let delivered = self.registry.broadcast(command, origin);
        debug!(session = %origin, command = %command, delivered, "Relayed pulse");
        Route::Broadcast { delivered }
    }

    /// Broadcasts a lifecycle notification for `origin` to every other
    /// session.
    ///
    /// Returns `None` when lifecycle events are disabled.
    pub fn announce(&self, origin: SessionId, event: Lifecycle) -> Option<usize> {
        if !self.emit_lifecycle_events {
            return None;
        }

        let command = match event.command() {
            Ok(command) => command,
            Err(e) => {
                error!(error = %e, event = %event, "Failed to build lifecycle command");
                return None;
            }
        };

        let delivered = self.registry.broadcast(&command, origin);
        debug!(session = %origin, event = %event, delivered, "Announced lifecycle event");
        Some(delivered)
    }

    /// Queues `num_players <n>` for a newly registered session, where `n`
    /// counts every registered session including `origin`.
    ///
    /// Returns `false` when lifecycle events are disabled or the session
    /// could not be reached.
    pub fn greet(&self, origin: SessionId) -> bool {
        if !self.emit_lifecycle_events {
            return false;
        }

        let count = self.registry.len();
        match num_players(count) {
            Ok(command) => self.registry.enqueue(origin, command),
            Err(e) => {
                error!(error = %e, "Failed to build player count");
                false
            }
        }
    }
}
