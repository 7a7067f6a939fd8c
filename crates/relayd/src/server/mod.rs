//! TCP server for the pulse relay.
//!
//! The server:
//! - Binds a TCP listener (default `0.0.0.0:9000`)
//! - Spawns one [`Session`] task per accepted connection
//! - Shares a single [`Registry`] handle with every session
//! - Stops accepting when its `CancellationToken` is triggered
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   RelayServer   │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │     Session     │────▶│     Router      │
//! │   (per client)  │     └────────┬────────┘
//! └───────▲─────────┘              │ broadcast
//!         │ outbox                 ▼
//!         │               ┌─────────────────┐
//!         └───────────────│    Registry     │
//!                         └─────────────────┘
//! ```
//!
//! Running sessions are not cancelled on shutdown; each ends through its
//! own termination conditions or at process exit.

mod session;

pub use session::{Session, SessionError, Termination};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use relay_core::SessionId;

use crate::config::RelayConfig;
use crate::registry::Registry;
use crate::router::Router;

/// TCP server for the pulse relay.
pub struct RelayServer {
    /// Bound listener
    listener: TcpListener,

    /// Effective configuration
    config: RelayConfig,

    /// Shared session registry
    registry: Registry,

    /// Router handed to each session
    router: Router,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for generating session ids
    connection_counter: AtomicU64,
}

impl RelayServer {
    /// Binds the listener described by `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration (listen address, limits, toggles)
    /// * `registry` - Registry shared by every session of this server
    /// * `cancel_token` - Token for graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(
        config: RelayConfig,
        registry: Registry,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: config.listen_addr,
                error: e.to_string(),
            })?;

        let router = Router::new(registry.clone(), config.emit_lifecycle_events);

        Ok(Self {
            listener,
            config,
            registry,
            router,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// Returns the address the listener is bound to.
    ///
    /// Differs from the configured address when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::LocalAddr(e.to_string()))
    }

    /// Returns the shared registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Runs the accept loop until the cancellation token is triggered.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!(
            addr = %self.local_addr()?,
            lifecycle_events = self.router.emits_lifecycle_events(),
            "Relay server listening"
        );

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(stream, addr, SessionId::new(conn_num));
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        info!(sessions = self.registry.len(), "Relay server stopped accepting");
        Ok(())
    }

    /// Spawns a session task for an accepted connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, id: SessionId) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(session = %id, error = %e, "Failed to set TCP_NODELAY");
        }

        let session = Session::new(
            stream,
            addr,
            id,
            self.registry.clone(),
            self.router.clone(),
            self.config.max_frame_len,
            self.config.write_timeout(),
        );

        tokio::spawn(async move {
            if let Err(e) = session.run().await {
                debug!(session = %id, error = %e, "Session ended with error");
            }
        });
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },

    #[error("Failed to read local address: {0}")]
    LocalAddr(String),
}
