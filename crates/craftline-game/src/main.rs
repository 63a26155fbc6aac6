//! Headless client binary.
//!
//! Loads `config.ron`, applies the `PORT` environment variable and CLI
//! flags, then plays a scripted bot against the relay until Ctrl-C.

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use craftline_config::{CliArgs, Config};
use craftline_game::{Autopilot, GameClient, GameLoop, LinkEvent, RelayLink, random_player_id};
use craftline_net::{FrameConfig, ReconnectPolicy};
use tokio::time::MissedTickBehavior;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const STATS_EVERY_FRAMES: u64 = 600;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(Config::default_dir);

    let (mut config, origin) = match Config::load_or_create(&config_dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            craftline_log::init_logging(None, None);
            tracing::error!("Failed to load config from {}: {e}", config_dir.display());
            std::process::exit(1);
        }
    };
    let env_override = config.apply_env_overrides(|key| std::env::var(key).ok());
    config.apply_cli_overrides(&args);

    craftline_log::init_logging(Some(&log_dir(&config_dir)), Some(&config));
    tracing::info!("{origin}");
    if let Err(e) = env_override {
        tracing::warn!("{e}");
    }

    let addr = format!(
        "{}:{}",
        config.network.server_address, config.network.server_port
    );
    let id = random_player_id();
    tracing::info!(
        "Craftline client {id} ({}) joining {addr}, seed {}",
        config.player.name,
        config.world.seed
    );

    let mut client = GameClient::new(&config, id);
    let mut link = RelayLink::connect(addr, reconnect_policy(&config), frame_config(&config));
    let mut pilot = Autopilot::new();
    let mut game_loop = GameLoop::new();

    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl-C received");
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = frames.tick() => {}
            _ = &mut shutdown => break,
        }

        match link.poll().await {
            LinkEvent::Opened => link.send_all(&[client.join_message()]).await,
            LinkEvent::GaveUp => tracing::warn!("Continuing offline"),
            LinkEvent::Idle | LinkEvent::Lost => {}
        }
        for message in link.drain_inbox() {
            client.handle_message(message);
        }

        let mut outgoing = Vec::new();
        game_loop.tick(|dt, now| {
            let input = pilot.next_input(dt, client.player());
            outgoing = client.frame(dt, now, &input);
        });
        link.send_all(&outgoing).await;

        if game_loop.frame_count() % STATS_EVERY_FRAMES == 0 {
            let position = client.player().position;
            tracing::info!(
                "pos ({:.1}, {:.1}, {:.1}), {} chunks, {} faces, {} other players, connected: {}",
                position.x,
                position.y,
                position.z,
                client.world().world().loaded_count(),
                client.world().face_count(),
                client.remotes().len(),
                link.is_connected()
            );
        }
    }

    link.close().await;
    tracing::info!("Client stopped after {:?}", game_loop.total_sim_time());
}

fn reconnect_policy(config: &Config) -> ReconnectPolicy {
    ReconnectPolicy {
        delay: config.network.reconnect_delay(),
        max_attempts: config.network.reconnect_max_attempts,
        connect_timeout: config.network.handshake_timeout(),
    }
}

fn frame_config(config: &Config) -> FrameConfig {
    FrameConfig {
        max_payload_size: config.network.max_payload_size,
    }
}

fn log_dir(config_dir: &Path) -> std::path::PathBuf {
    config_dir.join("logs")
}
