//! Per-connection session loop.
//!
//! Each accepted TCP connection gets its own `Session` that:
//! - Registers itself with the shared [`Registry`]
//! - Decodes newline-delimited commands and hands them to the [`Router`]
//! - Drains its outbound queue (broadcasts from other sessions) to the socket
//! - Deregisters on every exit path via its [`Membership`](crate::registry::Membership) guard
//!
//! # Loop
//!
//! The loop waits on two sources at once, biased toward the outbound
//! queue: a queued command is always written before the next inbound
//! frame is looked at, and an idle session still flushes a broadcast as
//! soon as it is enqueued.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?` or pattern matching
//! - Socket errors end the session; they never reach the accept loop

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, info_span, warn, Instrument};

use relay_core::{Command, PeerInfo, SessionId, SessionState};
use relay_protocol::{FrameError, PulseCodec, QUIT};

use crate::registry::{Registry, RegistryError};
use crate::router::{Lifecycle, Router};

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Client sent `quit`
    Quit,
    /// Client closed its end of the connection
    PeerClosed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quit => write!(f, "quit"),
            Self::PeerClosed => write!(f, "peer closed"),
        }
    }
}

/// Session for a single client connection.
pub struct Session {
    /// Server-assigned identifier
    id: SessionId,

    /// Remote address of the client
    addr: SocketAddr,

    /// Framed reader; its buffer is the inbound accumulator
    reader: FramedRead<OwnedReadHalf, PulseCodec>,

    /// Framed writer for outbound commands
    writer: FramedWrite<OwnedWriteHalf, PulseCodec>,

    /// Handle to the shared session registry
    registry: Registry,

    /// Command router
    router: Router,

    /// Lifecycle state
    state: SessionState,

    /// Upper bound on a single socket write
    write_timeout: Duration,
}

impl Session {
    /// Creates a session for an accepted connection.
    ///
    /// # Arguments
    ///
    /// * `stream` - The accepted TCP stream
    /// * `addr` - Remote address reported by `accept()`
    /// * `id` - Unique id for this connection
    /// * `registry` - Handle to the shared registry
    /// * `router` - Command router
    /// * `max_frame_len` - Longest accepted inbound frame
    /// * `write_timeout` - Upper bound on a single socket write
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        id: SessionId,
        registry: Registry,
        router: Router,
        max_frame_len: usize,
        write_timeout: Duration,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        let codec = PulseCodec::with_max_frame_len(max_frame_len);

        Self {
            id,
            addr,
            reader: FramedRead::new(reader, codec.clone()),
            writer: FramedWrite::new(writer, codec),
            registry,
            router,
            state: SessionState::Connecting,
            write_timeout,
        }
    }

    /// Runs the session until it terminates.
    ///
    /// Registers with the registry, processes frames, and deregisters on
    /// return. Runs inside a `session` tracing span.
    pub async fn run(self) -> Result<Termination, SessionError> {
        let span = info_span!("session", session = %self.id, addr = %self.addr);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> Result<Termination, SessionError> {
        info!("New client connected");

        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let membership = self
            .registry
            .add(PeerInfo::new(self.id, self.addr), outbox_tx)?;
        self.state = self.state.activate();
        debug!(state = ?self.state, "Session registered");

        self.router.announce(self.id, Lifecycle::Connect);
        self.router.greet(self.id);

        let outcome = self.process(outbox_rx).await;
        self.state = self.state.close();

        match &outcome {
            Ok(reason) => info!(reason = %reason, state = ?self.state, "Client disconnected"),
            Err(e) => warn!(error = %e, state = ?self.state, "Client disconnected with error"),
        }

        self.router.announce(self.id, Lifecycle::Disconnect);
        drop(membership);

        outcome
    }

    /// Main loop: flush queued commands first, otherwise wait for input.
    async fn process(
        &mut self,
        mut outbox: mpsc::UnboundedReceiver<Command>,
    ) -> Result<Termination, SessionError> {
        loop {
            tokio::select! {
                biased;

                Some(command) = outbox.recv() => {
                    self.send(command).await?;
                }

                frame = self.reader.next() => match frame {
                    None => {
                        debug!("Client sent EOF");
                        return Ok(Termination::PeerClosed);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(command)) => {
                        if command.is(QUIT) {
                            debug!("Client requested quit");
                            return Ok(Termination::Quit);
                        }
                        self.router.route(self.id, &command);
                    }
                },
            }
        }
    }

    /// Writes one command plus delimiter, bounded by the write timeout.
    async fn send(&mut self, command: Command) -> Result<(), SessionError> {
        match timeout(self.write_timeout, self.writer.send(command)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::Frame(e)),
            Err(_) => Err(SessionError::WriteTimeout),
        }
    }
}

/// Errors that end a session abnormally.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistryError),

    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("Write timeout")]
    WriteTimeout,
}
