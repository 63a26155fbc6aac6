//! Command-line argument parsing shared by the Craftline binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Craftline command-line arguments.
///
/// CLI values override settings loaded from `config.ron` and the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "craftline", about = "Craftline voxel world relay")]
pub struct CliArgs {
    /// Server address (client only).
    #[arg(long)]
    pub server: Option<String>,

    /// Listener / server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Terrain seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Render distance in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Player display name (client only).
    #[arg(long)]
    pub name: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref addr) = args.server {
            self.network.server_address = addr.clone();
        }
        if let Some(port) = args.port {
            self.network.server_port = port;
        }
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(rd) = args.render_distance {
            self.world.render_distance = rd;
        }
        if let Some(ref name) = args.name {
            self.player.name = name.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            server: Some("192.168.1.1".to_string()),
            seed: Some(42),
            name: Some("Alex".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.network.server_address, "192.168.1.1");
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.player.name, "Alex");
        // Non-overridden fields retain defaults
        assert_eq!(config.network.server_port, 3000);
        assert_eq!(config.world.render_distance, 3);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["craftline", "--port", "9000", "--render-distance", "5"]);
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.render_distance, Some(5));
        assert!(args.server.is_none());
    }
}
