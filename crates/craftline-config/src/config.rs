//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable selecting the TCP port of the combined listener.
pub const PORT_ENV_VAR: &str = "PORT";

/// Top-level configuration shared by the server and client binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World generation and streaming settings.
    pub world: WorldConfig,
    /// Network/multiplayer settings.
    pub network: NetworkConfig,
    /// Local player settings (client only).
    pub player: PlayerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World generation and chunk streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Terrain seed. Every session must use the same value to see the same world.
    pub seed: u32,
    /// Render distance in chunks (Chebyshev radius around the viewer).
    pub render_distance: u32,
    /// Interval between chunk load/unload passes, in milliseconds.
    pub chunk_update_interval_ms: u64,
}

/// Network/multiplayer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server address the client connects to.
    pub server_address: String,
    /// Port of the combined HTTP/relay listener.
    pub server_port: u16,
    /// Maximum concurrent sessions (server only).
    pub max_connections: usize,
    /// Largest accepted frame payload in bytes.
    pub max_payload_size: u64,
    /// Interval between position updates sent by the client, in milliseconds.
    pub position_send_interval_ms: u64,
    /// Fixed delay before each reconnection attempt, in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Reconnection attempt cap. `None` retries forever.
    pub reconnect_max_attempts: Option<u32>,
    /// Limit on the upgrade handshake, in milliseconds. The server drops
    /// peers that exceed it; the client abandons the attempt.
    pub handshake_timeout_ms: u64,
}

/// Local player configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Display name announced on join.
    pub name: String,
    /// Start in flying mode (no gravity).
    pub fly: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            render_distance: 3,
            chunk_update_interval_ms: 500,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 3000,
            max_connections: 64,
            max_payload_size: 1_048_576,
            position_send_interval_ms: 100,
            reconnect_delay_ms: 3000,
            reconnect_max_attempts: None,
            handshake_timeout_ms: 10_000,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
            fly: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl WorldConfig {
    /// Chunk streaming cadence as a [`Duration`].
    pub fn chunk_update_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_update_interval_ms)
    }
}

impl NetworkConfig {
    /// Position send cadence as a [`Duration`].
    pub fn position_send_interval(&self) -> Duration {
        Duration::from_millis(self.position_send_interval_ms)
    }

    /// Reconnection delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Where [`Config::load_or_create`] got its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from an existing file.
    Loaded(PathBuf),
    /// No file existed; defaults were written here.
    Created(PathBuf),
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded(path) => write!(f, "loaded config from {}", path.display()),
            Self::Created(path) => write!(f, "created default config at {}", path.display()),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default config directory (`<platform config dir>/craftline`), falling
    /// back to the working directory when the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("craftline"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load config from the given directory, or create a default config file.
    ///
    /// Runs before logging is set up, so the caller reports the returned
    /// [`ConfigOrigin`] once it is.
    pub fn load_or_create(config_dir: &Path) -> Result<(Self, ConfigOrigin), ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            Ok((config, ConfigOrigin::Loaded(config_path)))
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            Ok((config, ConfigOrigin::Created(config_path)))
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// Only [`PORT_ENV_VAR`] is recognized. An unparseable value leaves the
    /// config untouched and is returned as [`ConfigError::InvalidEnv`] for the
    /// caller to warn about.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(PORT_ENV_VAR) {
            let port = raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: PORT_ENV_VAR,
                    value: raw.clone(),
                })?;
            self.network.server_port = port;
        }
        Ok(())
    }
}
