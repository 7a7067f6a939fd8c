//! Session identity and lifecycle types.

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Server-assigned identifier for one client connection.
///
/// Allocated from a monotonically increasing counter at accept time, so two
/// connections from the same remote address never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a SessionId from a connection number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying connection number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle state of a session.
///
/// ```text
/// Connecting ──(registry add)──▶ Active ──(quit / EOF / I/O error)──▶ Closed
/// ```
///
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Connecting,
    Active,
    Closed,
}

impl SessionState {
    /// Returns the state after registry membership is acquired.
    ///
    /// Only `Connecting` advances; other states are returned unchanged.
    #[must_use]
    pub fn activate(self) -> Self {
        match self {
            Self::Connecting => Self::Active,
            other => other,
        }
    }

    /// Returns the terminal state. Idempotent.
    #[must_use]
    pub fn close(self) -> Self {
        Self::Closed
    }

    /// Returns true while the session is registered and processing frames.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true once the session has terminated.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ============================================================================
// Peer Info
// ============================================================================

/// Read-only view of a registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: SessionId,
    pub addr: SocketAddr,
    pub connected_at: DateTime<Utc>,
}

impl PeerInfo {
    /// Creates peer info stamped with the current time.
    pub fn new(id: SessionId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            connected_at: Utc::now(),
        }
    }

    /// Time elapsed since the connection was accepted.
    pub fn connected_for(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.connected_at)
    }
}
