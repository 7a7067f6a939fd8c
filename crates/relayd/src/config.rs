//! Relay server configuration.
//!
//! Settings are layered, lowest precedence first:
//! 1. Built-in defaults ([`RelayConfig::default`])
//! 2. An optional TOML file ([`RelayConfig::load`])
//! 3. Command-line overrides ([`ConfigOverrides::apply`])
//!
//! Every TOML key is optional; unknown keys are rejected so typos surface
//! at startup instead of being silently ignored.
//!
//! ```toml
//! listen_addr = "0.0.0.0:9000"
//! emit_lifecycle_events = true
//! max_frame_len = 4096
//! write_timeout_secs = 5
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_protocol::DEFAULT_MAX_FRAME_LEN;
use serde::Deserialize;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default socket write timeout (10 seconds)
const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

/// Top-level relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Address the TCP listener binds to
    pub listen_addr: SocketAddr,

    /// Broadcast `player_connect`/`player_disconnect` and greet new
    /// clients with `num_players <n>`
    pub emit_lifecycle_events: bool,

    /// Longest accepted inbound frame in bytes, delimiter excluded
    pub max_frame_len: usize,

    /// Seconds a single socket write may take before the session is dropped
    pub write_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            emit_lifecycle_events: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML,
    /// or holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_len == 0 {
            return Err(ConfigError::Invalid {
                field: "max_frame_len",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.write_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "write_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the socket write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// Command-line overrides applied on top of the file/default config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    /// `true` forces lifecycle events on; `false` leaves the loaded value
    pub emit_lifecycle_events: bool,
}

impl ConfigOverrides {
    /// Applies the overrides to `config`.
    pub fn apply(&self, mut config: RelayConfig) -> RelayConfig {
        if let Some(host) = self.host {
            config.listen_addr.set_ip(host);
        }
        if let Some(port) = self.port {
            config.listen_addr.set_port(port);
        }
        if self.emit_lifecycle_events {
            config.emit_lifecycle_events = true;
        }
        config
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
