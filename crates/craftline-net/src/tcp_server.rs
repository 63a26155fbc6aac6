//! TCP listener that upgrades connections and feeds the world relay.
//!
//! Each accepted connection gets its own task: it performs the upgrade
//! handshake (bounded by [`ServerConfig::handshake_timeout`]), registers an outbox with the relay, then reads frames until
//! the peer closes. A companion writer task drains the outbox into text
//! frames. Malformed frames and payloads are dropped; the session stays open.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

use crate::framing::{FrameConfig, FrameError, Opcode, read_frame, write_frame};
use crate::handshake::{DEFAULT_HANDSHAKE_TIMEOUT, HandshakeError, accept_upgrade};
use crate::messages::{Inbound, MessageError, decode_inbound};
use crate::relay::{OUTBOX_CAPACITY, RelayEvent, RelayHandle};

/// Unique identifier for a connection within a server run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Hands out increasing [`ConnectionId`]s starting at 1.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection limit of {0} reached")]
pub struct ConnectionLimitReached(pub usize);

/// Counts live connections against a fixed cap.
#[derive(Debug)]
pub struct ConnectionLimiter {
    active: AtomicUsize,
    max: usize,
}

/// Occupies one slot of a [`ConnectionLimiter`] until dropped.
#[derive(Debug)]
pub struct ConnectionSlot {
    limiter: Arc<ConnectionLimiter>,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicUsize::new(0),
            max,
        })
    }

    pub fn try_acquire(self: &Arc<Self>) -> Result<ConnectionSlot, ConnectionLimitReached> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .map_err(|_| ConnectionLimitReached(self.max))?;
        Ok(ConnectionSlot {
            limiter: Arc::clone(self),
        })
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.limiter.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Configuration for [`RelayServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Default: `0.0.0.0:3000`.
    pub bind_addr: SocketAddr,
    /// Default: 64.
    pub max_connections: usize,
    /// A peer that has not completed the upgrade by then is dropped and its
    /// slot freed. Default: 10 s.
    pub handshake_timeout: Duration,
    pub frame: FrameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 64,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            frame: FrameConfig::default(),
        }
    }
}

/// Accept loop for relay sessions.
pub struct RelayServer {
    config: ServerConfig,
    relay: RelayHandle,
    limiter: Arc<ConnectionLimiter>,
    id_gen: Arc<IdGenerator>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RelayServer {
    pub fn new(config: ServerConfig, relay: RelayHandle) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            limiter: ConnectionLimiter::new(config.max_connections),
            id_gen: Arc::new(IdGenerator::new()),
            config,
            relay,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Binds the configured address and runs the accept loop.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("Relay listening on {}", listener.local_addr()?);
        self.run_with_listener(listener).await
    }

    /// Runs the accept loop on a pre-bound listener until [`shutdown`](Self::shutdown).
    pub async fn run_with_listener(&self, listener: TcpListener) -> std::io::Result<()> {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer_addr) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!("Accept failed: {e}");
                            continue;
                        }
                    };

                    let slot = match self.limiter.try_acquire() {
                        Ok(slot) => slot,
                        Err(e) => {
                            tracing::warn!("Rejecting {peer_addr}: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!("set_nodelay failed for {peer_addr}: {e}");
                    }

                    let id = self.id_gen.next_id();
                    tracing::debug!("Accepted connection {id:?} from {peer_addr}");

                    let relay = self.relay.clone();
                    let frame = self.config.frame.clone();
                    let handshake_timeout = self.config.handshake_timeout;
                    let task_shutdown = self.shutdown_rx.clone();
                    tokio::spawn(async move {
                        handle_connection(id, stream, relay, frame, handshake_timeout, task_shutdown)
                            .await;
                        drop(slot);
                        tracing::debug!("Connection {id:?} closed");
                    });
                }
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    tracing::info!("Relay shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn active_connections(&self) -> usize {
        self.limiter.active()
    }
}

async fn handle_connection(
    id: ConnectionId,
    stream: TcpStream,
    relay: RelayHandle,
    frame: FrameConfig,
    handshake_timeout: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let upgrade = tokio::select! {
        result = tokio::time::timeout(
            handshake_timeout,
            accept_upgrade(&mut reader, &mut write_half),
        ) => result.unwrap_or(Err(HandshakeError::TimedOut(handshake_timeout))),
        _ = shutdown_rx.wait_for(|stop| *stop) => {
            tracing::debug!("Connection {id:?} dropped mid-handshake by shutdown");
            return;
        }
    };

    match upgrade {
        Ok(head) => tracing::debug!("Connection {id:?} upgraded ({})", head.path()),
        Err(HandshakeError::NotUpgrade(line)) => {
            tracing::debug!("Connection {id:?} answered 404: {line}");
            return;
        }
        Err(e) => {
            tracing::debug!("Connection {id:?} handshake failed: {e}");
            return;
        }
    }

    let (outbox, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);
    if !relay.send(RelayEvent::Connected { conn: id, outbox }).await {
        return;
    }

    let writer = tokio::spawn(write_loop(id, write_half, outbox_rx, frame.clone()));
    read_loop(id, &mut reader, &relay, &frame, &mut shutdown_rx).await;

    // The relay drops the outbox when it sees this, which ends the writer.
    relay.send(RelayEvent::Disconnected { conn: id }).await;
    let _ = writer.await;
}

async fn read_loop(
    id: ConnectionId,
    reader: &mut BufReader<OwnedReadHalf>,
    relay: &RelayHandle,
    config: &FrameConfig,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        let result = tokio::select! {
            result = read_frame(reader, config) => result,
            _ = shutdown_rx.wait_for(|stop| *stop) => break,
        };

        let frame = match result {
            Ok(frame) => frame,
            Err(FrameError::PayloadTooLarge { size, max }) => {
                tracing::debug!("Dropping {size}-byte frame from {id:?} (max {max})");
                continue;
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(FrameError::Io(e)) => {
                tracing::debug!("Read error on {id:?}: {e}");
                break;
            }
        };

        match frame.opcode {
            Opcode::Close => {
                tracing::debug!("Connection {id:?} sent close");
                break;
            }
            Opcode::Text => {
                let Some(text) = frame.text() else {
                    tracing::debug!("Dropping non-UTF-8 text frame from {id:?}");
                    continue;
                };
                let event = match decode_inbound(text) {
                    Ok(Inbound::Message(message)) => RelayEvent::Message { conn: id, message },
                    Ok(Inbound::Block(payload)) => RelayEvent::Block { conn: id, payload },
                    Err(MessageError::UnknownType(kind)) => {
                        tracing::trace!("Ignoring {kind:?} message from {id:?}");
                        continue;
                    }
                    Err(e) => {
                        tracing::debug!("Dropping payload from {id:?}: {e}");
                        continue;
                    }
                };
                if !relay.send(event).await {
                    break;
                }
            }
            other => tracing::trace!("Ignoring {other:?} frame from {id:?}"),
        }
    }
}

async fn write_loop(
    id: ConnectionId,
    mut writer: OwnedWriteHalf,
    mut outbox: mpsc::Receiver<Arc<str>>,
    config: FrameConfig,
) {
    while let Some(text) = outbox.recv().await {
        let result = write_frame(&mut writer, Opcode::Text, text.as_bytes(), None, &config).await;
        if let Err(e) = result {
            tracing::debug!("Write to {id:?} failed: {e}");
            break;
        }
    }
}
