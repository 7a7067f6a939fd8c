//! Shared helpers for relay integration tests.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use relayd::config::RelayConfig;
use relayd::registry::Registry;
use relayd::server::RelayServer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a client must stay quiet to count as "received nothing"
pub const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// Maximum time to wait for the registry to reach an expected size
pub const REGISTRY_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Interval between registry size checks
pub const REGISTRY_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Test Server
// ============================================================================

/// Relay server running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Registry,
    pub cancel_token: CancellationToken,
}

impl TestServer {
    /// Spawns a server with default settings.
    pub async fn spawn() -> Self {
        Self::spawn_with(RelayConfig::default()).await
    }

    /// Spawns a server with lifecycle events enabled.
    pub async fn spawn_with_lifecycle() -> Self {
        Self::spawn_with(RelayConfig {
            emit_lifecycle_events: true,
            ..RelayConfig::default()
        })
        .await
    }

    /// Spawns a server with `config`, overriding the listen address.
    pub async fn spawn_with(config: RelayConfig) -> Self {
        let config = RelayConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            ..config
        };

        let registry = Registry::new();
        let cancel_token = CancellationToken::new();

        let server = RelayServer::bind(config, registry.clone(), cancel_token.clone())
            .await
            .expect("bind relay server");
        let addr = server.local_addr().expect("local addr");

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        TestServer {
            addr,
            registry,
            cancel_token,
        }
    }

    /// Connects a client and waits until the server has registered it.
    pub async fn connect(&self) -> TestClient {
        let before = self.registry.len();
        let client = TestClient::connect(self.addr).await;
        self.wait_for_sessions(before + 1).await;
        client
    }

    /// Waits until the registry holds exactly `expected` sessions.
    pub async fn wait_for_sessions(&self, expected: usize) {
        let start = Instant::now();
        while start.elapsed() < REGISTRY_WAIT_TIMEOUT {
            if self.registry.len() == expected {
                return;
            }
            sleep(REGISTRY_POLL_INTERVAL).await;
        }
        panic!(
            "registry size {} did not reach {expected} within {REGISTRY_WAIT_TIMEOUT:?}",
            self.registry.len()
        );
    }

    /// Stops accepting new connections.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

// ============================================================================
// Test Client
// ============================================================================

/// Raw line-oriented client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to relay");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Writes raw bytes exactly as given.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Sends one command followed by the delimiter.
    pub async fn send(&mut self, command: &str) {
        self.send_raw(format!("{command}\n").as_bytes()).await;
    }

    /// Receives one frame, without its delimiter.
    pub async fn recv(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for frame")
            .expect("read frame");
        assert!(n > 0, "connection closed while waiting for frame");
        assert!(line.ends_with('\n'), "frame missing delimiter: {line:?}");
        line.pop();
        line
    }

    /// Asserts nothing arrives within the silence window.
    pub async fn expect_silence(&mut self) {
        let mut line = String::new();
        if let Ok(result) = timeout(SILENCE_WINDOW, self.reader.read_line(&mut line)).await {
            panic!("expected silence, got {result:?} with {line:?}");
        }
    }

    /// Asserts the server closes the connection.
    pub async fn expect_closed(&mut self) {
        let mut line = String::new();
        match timeout(RECV_TIMEOUT, self.reader.read_line(&mut line)).await {
            Ok(Ok(0)) | Ok(Err(_)) => {}
            Ok(Ok(_)) => panic!("expected close, got frame {line:?}"),
            Err(_) => panic!("connection still open after {RECV_TIMEOUT:?}"),
        }
    }

    /// Half-closes the connection (client stops sending).
    pub async fn shutdown_write(&mut self) {
        self.writer.shutdown().await.unwrap();
    }
}
