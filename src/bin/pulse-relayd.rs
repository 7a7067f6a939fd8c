//! Pulse relay daemon
//!
//! Accepts TCP clients and rebroadcasts `pulse_alpha`/`pulse_beta` from any
//! client to every other connected client.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:9000
//! pulse-relayd
//!
//! # Custom address, with join/leave notifications
//! pulse-relayd --host 127.0.0.1 --port 9100 --lifecycle-events
//!
//! # Load settings from a TOML file (flags still win)
//! pulse-relayd --config relay.toml
//!
//! # Enable debug logging
//! RUST_LOG=relayd=debug pulse-relayd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: stop accepting new connections and exit

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relayd::config::{ConfigOverrides, RelayConfig};
use relayd::registry::Registry;
use relayd::server::RelayServer;

/// Pulse relay - multiplayer heartbeat relay server
#[derive(Parser, Debug)]
#[command(name = "pulse-relayd", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Announce player_connect/player_disconnect and send num_players on connect
    #[arg(long)]
    lifecycle_events: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host,
            port: self.port,
            emit_lifecycle_events: self.lifecycle_events,
        }
    }
}

/// Builds the effective configuration from defaults, file and flags.
fn load_config(args: &Args) -> Result<RelayConfig> {
    let base = match &args.config {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RelayConfig::default(),
    };
    Ok(args.overrides().apply(base))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("relayd=info".parse()?)
                .add_directive("relay_core=info".parse()?)
                .add_directive("relay_protocol=info".parse()?),
        )
        .init();

    let config = load_config(&args)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Pulse relay starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = Registry::new();
    let server = RelayServer::bind(config, registry, cancel_token)
        .await
        .context("Failed to start relay server")?;

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Pulse relay stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
