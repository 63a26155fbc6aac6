//! Configuration for the Craftline relay server and client.
//!
//! Settings persist to disk as RON files. CLI flags (clap) and the `PORT`
//! environment variable override values loaded from `config.ron`.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, ConfigOrigin, DebugConfig, NetworkConfig, PORT_ENV_VAR, PlayerConfig, WorldConfig,
};
pub use error::ConfigError;
