//! Relay server wiring: maps [`Config`] onto the net layer and runs the
//! listener until a shutdown signal arrives.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use craftline_config::Config;
use craftline_net::relay::EVENT_CAPACITY;
use craftline_net::{FrameConfig, RelayServer, ServerConfig, WorldRelay};
use tokio::net::TcpListener;

/// How long to wait for open sessions to wind down after shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Listener settings derived from `config`. Binds all interfaces.
pub fn server_config(config: &Config) -> ServerConfig {
    ServerConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], config.network.server_port)),
        max_connections: config.network.max_connections,
        handshake_timeout: config.network.handshake_timeout(),
        frame: FrameConfig {
            max_payload_size: config.network.max_payload_size,
        },
    }
}

/// Binds the configured port and serves until `shutdown` resolves.
pub async fn run(config: &Config, shutdown: impl Future<Output = ()>) -> std::io::Result<()> {
    let listener = TcpListener::bind(server_config(config).bind_addr).await?;
    run_with_listener(config, listener, shutdown).await
}

/// Serves on a pre-bound listener until `shutdown` resolves.
pub async fn run_with_listener(
    config: &Config,
    listener: TcpListener,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()> {
    let (relay, relay_task) = WorldRelay::spawn(EVENT_CAPACITY);
    let server = RelayServer::new(server_config(config), relay);
    tracing::info!(
        "Relay listening on {} (max {} sessions)",
        listener.local_addr()?,
        config.network.max_connections
    );

    tokio::select! {
        result = server.run_with_listener(listener) => result?,
        _ = shutdown => server.shutdown(),
    }
    drop(server);

    match tokio::time::timeout(DRAIN_TIMEOUT, relay_task).await {
        Ok(Ok(registry)) => {
            tracing::info!("Relay stopped, {} sessions remained", registry.session_count());
        }
        Ok(Err(e)) => tracing::warn!("Relay task failed: {e}"),
        Err(_) => tracing::warn!("Sessions still open after {DRAIN_TIMEOUT:?}, exiting"),
    }
    Ok(())
}
