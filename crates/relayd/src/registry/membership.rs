//! Scoped registry membership.

use std::fmt;

use tracing::warn;

use relay_core::SessionId;

use super::Registry;

/// Proof that a session is registered.
///
/// Dropping the guard deregisters the session. This is the only place a
/// session leaves the registry, so every exit from the session loop
/// (return, `?` error, or panic unwind) releases membership exactly once.
#[must_use = "dropping the membership deregisters the session immediately"]
pub struct Membership {
    registry: Registry,
    session_id: SessionId,
}

impl Membership {
    pub(super) fn new(registry: Registry, session_id: SessionId) -> Self {
        Self {
            registry,
            session_id,
        }
    }

    /// Returns the id of the registered session.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        if !self.registry.remove(self.session_id) {
            warn!(session = %self.session_id, "Session was already deregistered");
        }
    }
}

impl fmt::Debug for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Membership")
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use relay_core::PeerInfo;
    use tokio::sync::mpsc;

    fn info(id: u64) -> PeerInfo {
        let addr: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        PeerInfo::new(SessionId::new(id), addr)
    }

    #[test]
    fn test_drop_deregisters() {
        let registry = Registry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        {
            let membership = registry.add(info(1), tx).unwrap();
            assert_eq!(membership.session_id(), SessionId::new(1));
            assert!(registry.contains(SessionId::new(1)));
        }

        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_on_error_path() {
        fn fails(registry: &Registry) -> Result<(), &'static str> {
            let (tx, _rx) = mpsc::unbounded_channel();
            let _membership = registry.add(info(2), tx).map_err(|_| "add")?;
            Err("socket error")
        }

        let registry = Registry::new();
        assert!(fails(&registry).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_on_panic_unwind() {
        let registry = Registry::new();
        let shared = registry.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let (tx, _rx) = mpsc::unbounded_channel();
            let _membership = shared.add(info(3), tx).unwrap();
            panic!("session task panicked");
        }));

        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_after_manual_remove_is_harmless() {
        let registry = Registry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let membership = registry.add(info(4), tx).unwrap();

        assert!(registry.remove(SessionId::new(4)));
        drop(membership);
        assert!(registry.is_empty());
    }
}
