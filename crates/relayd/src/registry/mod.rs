//! Shared registry of live sessions.
//!
//! The registry is the only state shared between connection tasks. Each
//! entry holds a back-reference to a session (its address and the sending
//! half of its outbound queue), never the session itself: a session's
//! lifetime is governed by its own loop, and its registry entry is released
//! through the [`Membership`] guard when that loop ends.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐  add()  ┌──────────────────────────────┐
//! │ Session A │────────▶│           Registry           │
//! └───────────┘         │ RwLock<HashMap<SessionId,    │
//!       ▲               │                Peer>>        │
//!       │ outbox        └──────────────┬───────────────┘
//!       │                              │ broadcast(cmd, excluding = B)
//! ┌─────┴─────┐                        ▼
//! │ mpsc::rx  │◀─────────────── peer.outbox.send(cmd)
//! └───────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()` or `.expect()` in production code
//! - A poisoned lock is recovered rather than propagated: the map holds
//!   no invariants a panicking writer could leave half-applied
//! - Sends to a closed outbox are counted as undelivered, not errors

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use relay_core::{Command, PeerInfo, SessionId};

mod membership;

pub use membership::Membership;

/// Sending half of a session's outbound queue.
///
/// Unbounded and multi-producer: any task may append, the owning session
/// drains it in FIFO order.
pub type Outbox = mpsc::UnboundedSender<Command>;

/// A registered session.
struct Peer {
    info: PeerInfo,
    outbox: Outbox,
}

/// Handle to the shared session registry.
///
/// Cheap to clone; every clone refers to the same member set. Create one
/// per server instance and hand a clone to each session.
#[derive(Clone, Default)]
pub struct Registry {
    peers: Arc<RwLock<HashMap<SessionId, Peer>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session and returns its membership guard.
    ///
    /// The entry is removed when the returned [`Membership`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SessionAlreadyExists` if the id is already
    /// registered; the existing entry is left untouched.
    pub fn add(&self, info: PeerInfo, outbox: Outbox) -> Result<Membership, RegistryError> {
        let session_id = info.id;
        {
            let mut peers = self.write();
            if peers.contains_key(&session_id) {
                return Err(RegistryError::SessionAlreadyExists { session_id });
            }
            peers.insert(session_id, Peer { info, outbox });
        }

        debug!(session = %session_id, "Session registered");
        Ok(Membership::new(self.clone(), session_id))
    }

    /// Removes a session. Returns `true` if it was registered.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn remove(&self, session_id: SessionId) -> bool {
        let removed = self.write().remove(&session_id);
        match removed {
            Some(peer) => {
                debug!(
                    session = %session_id,
                    connected_ms = peer.info.connected_for().num_milliseconds(),
                    "Session deregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Appends `command` to the outbound queue of every session except
    /// `excluding`.
    ///
    /// Returns the number of queues the command was appended to. A session
    /// that is mid-shutdown (receiver already dropped) is skipped.
    pub fn broadcast(&self, command: &Command, excluding: SessionId) -> usize {
        let peers = self.read();
        let mut delivered = 0;

        for (session_id, peer) in peers.iter() {
            if *session_id == excluding {
                continue;
            }
            if peer.outbox.send(command.clone()).is_ok() {
                delivered += 1;
            } else {
                trace!(session = %session_id, "Outbox closed, skipping");
            }
        }

        delivered
    }

    /// Appends `command` to a single session's outbound queue.
    ///
    /// Returns `false` if the session is not registered or its queue is
    /// closed.
    pub fn enqueue(&self, session_id: SessionId, command: Command) -> bool {
        self.read()
            .get(&session_id)
            .is_some_and(|peer| peer.outbox.send(command).is_ok())
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns true if `session_id` is registered.
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.read().contains_key(&session_id)
    }

    /// Returns a snapshot of all registered sessions, ordered by id.
    pub fn peers(&self) -> Vec<PeerInfo> {
        let mut infos: Vec<PeerInfo> = self.read().values().map(|p| p.info.clone()).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Peer>> {
        self.peers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Peer>> {
        self.peers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Errors that can occur in registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Session already registered: {session_id}")]
    SessionAlreadyExists { session_id: SessionId },
}
