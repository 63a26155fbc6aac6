//! Client side of a relay session.
//!
//! [`RelayClient::connect`] performs the upgrade handshake and spawns a
//! reader task that decodes incoming frames onto an mpsc inbox. Outgoing
//! messages are masked text frames. State changes are published through a
//! [`watch`] channel so the game loop can poll without blocking.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, watch};

use crate::framing::{FrameConfig, FrameError, Opcode, read_frame, write_frame};
use crate::handshake::{DEFAULT_HANDSHAKE_TIMEOUT, HandshakeError, request_upgrade};
use crate::messages::{MessageError, WireMessage, decode_message, encode_message};

/// Capacity of the client's inbound message queue.
pub const INBOX_CAPACITY: usize = 256;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Observable connection state backed by a [`watch`] channel.
#[derive(Debug)]
pub struct ConnectionStateWatch {
    tx: watch::Sender<ConnectionState>,
    rx: watch::Receiver<ConnectionState>,
}

impl Default for ConnectionStateWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateWatch {
    /// Starts out [`ConnectionState::Disconnected`].
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx, rx }
    }

    pub fn set(&self, state: ConnectionState) {
        let _ = self.tx.send(state);
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.rx.clone()
    }

    pub fn current(&self) -> ConnectionState {
        *self.rx.borrow()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("not connected")]
    NotConnected,
}

/// Handle to an open relay session.
#[derive(Debug)]
pub struct RelayClient {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    state: Arc<ConnectionStateWatch>,
    frame: FrameConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl RelayClient {
    /// Connects to `addr` (`host:port`), upgrades the stream, and starts the
    /// reader task. Decoded server messages arrive on the returned receiver.
    pub async fn connect(
        addr: &str,
        frame: FrameConfig,
    ) -> Result<(Self, mpsc::Receiver<WireMessage>), ClientError> {
        Self::connect_with_timeout(addr, frame, DEFAULT_HANDSHAKE_TIMEOUT).await
    }

    /// [`connect`](Self::connect), giving up when the TCP connect and the
    /// upgrade together take longer than `timeout`.
    pub async fn connect_with_timeout(
        addr: &str,
        frame: FrameConfig,
        timeout: Duration,
    ) -> Result<(Self, mpsc::Receiver<WireMessage>), ClientError> {
        let state = Arc::new(ConnectionStateWatch::new());
        state.set(ConnectionState::Connecting);

        let opened = tokio::time::timeout(timeout, open_upgraded(addr))
            .await
            .unwrap_or(Err(HandshakeError::TimedOut(timeout).into()));
        let (reader, write_half) = match opened {
            Ok(halves) => halves,
            Err(e) => {
                state.set(ConnectionState::Disconnected);
                return Err(e);
            }
        };
        state.set(ConnectionState::Connected);
        tracing::info!("Connected to relay at {addr}");

        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reader_state = Arc::clone(&state);
        let reader_frame = frame.clone();
        tokio::spawn(async move {
            read_loop(reader, inbox_tx, &reader_state, &reader_frame, shutdown_rx).await;
        });

        let client = Self {
            writer: Arc::new(Mutex::new(write_half)),
            state,
            frame,
            shutdown_tx,
        };
        Ok((client, inbox_rx))
    }

    pub fn state(&self) -> &Arc<ConnectionStateWatch> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.current() == ConnectionState::Connected
    }

    /// Sends one message as a masked text frame.
    pub async fn send(&self, msg: &WireMessage) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let text = encode_message(msg)?;
        let mut writer = self.writer.lock().await;
        let result = write_frame(
            &mut *writer,
            Opcode::Text,
            text.as_bytes(),
            Some(rand::random()),
            &self.frame,
        )
        .await;
        if result.is_err() {
            self.state.set(ConnectionState::Disconnected);
        }
        result.map_err(ClientError::from)
    }

    /// Sends a close frame and stops the reader task.
    pub async fn disconnect(&self) {
        if self.is_connected() {
            let mut writer = self.writer.lock().await;
            let _ = write_frame(
                &mut *writer,
                Opcode::Close,
                &[],
                Some(rand::random()),
                &self.frame,
            )
            .await;
        }
        let _ = self.shutdown_tx.send(true);
        self.state.set(ConnectionState::Disconnected);
    }
}

async fn open_upgraded(
    addr: &str,
) -> Result<(BufReader<OwnedReadHalf>, OwnedWriteHalf), ClientError> {
    let stream = TcpStream::connect(addr).await?;
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("set_nodelay failed: {e}");
    }

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    request_upgrade(&mut reader, &mut write_half, addr, "/").await?;
    Ok((reader, write_half))
}

async fn read_loop(
    mut reader: BufReader<OwnedReadHalf>,
    inbox: mpsc::Sender<WireMessage>,
    state: &ConnectionStateWatch,
    config: &FrameConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let result = tokio::select! {
            result = read_frame(&mut reader, config) => result,
            _ = shutdown_rx.wait_for(|stop| *stop) => break,
        };

        let frame = match result {
            Ok(frame) => frame,
            Err(FrameError::PayloadTooLarge { size, .. }) => {
                tracing::debug!("Dropping {size}-byte frame from relay");
                continue;
            }
            Err(e) => {
                tracing::info!("Relay connection lost: {e}");
                break;
            }
        };

        match frame.opcode {
            Opcode::Close => {
                tracing::info!("Relay closed the session");
                break;
            }
            Opcode::Text => match frame.text().map(decode_message) {
                Some(Ok(message)) => {
                    if inbox.send(message).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => tracing::debug!("Dropping relay payload: {e}"),
                None => tracing::debug!("Dropping non-UTF-8 frame from relay"),
            },
            _ => {}
        }
    }
    state.set(ConnectionState::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::net::TcpListener;

    use crate::handshake::accept_upgrade;
    use crate::messages::{BlockChange, Join};
    use crate::relay::{EVENT_CAPACITY, WorldRelay};
    use crate::tcp_server::{RelayServer, ServerConfig};

    async fn relay_server() -> String {
        let (relay, _task) = WorldRelay::spawn(EVENT_CAPACITY);
        let server = Arc::new(RelayServer::new(ServerConfig::default(), relay));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            server.run_with_listener(listener).await.unwrap();
        });
        addr.to_string()
    }

    fn join(id: &str) -> WireMessage {
        WireMessage::Join(Join {
            id: id.into(),
            name: id.into(),
            x: Some(0.0),
            y: Some(32.0),
            z: Some(0.0),
        })
    }

    async fn next(inbox: &mut mpsc::Receiver<WireMessage>) -> WireMessage {
        tokio::time::timeout(Duration::from_secs(2), inbox.recv())
            .await
            .expect("timed out")
            .expect("inbox closed")
    }

    #[tokio::test]
    async fn test_connection_state_transitions() {
        let watch = ConnectionStateWatch::new();
        assert_eq!(watch.current(), ConnectionState::Disconnected);
        watch.set(ConnectionState::Connecting);
        assert_eq!(watch.current(), ConnectionState::Connecting);
        watch.set(ConnectionState::Connected);
        assert_eq!(watch.current(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let result = RelayClient::connect(&addr, FrameConfig::default()).await;
        assert!(matches!(result, Err(ClientError::Io(_))));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            RelayClient::connect_with_timeout(
                &addr,
                FrameConfig::default(),
                Duration::from_millis(100),
            ),
        )
        .await
        .expect("connect did not give up");
        assert!(matches!(
            result,
            Err(ClientError::Handshake(HandshakeError::TimedOut(_)))
        ));
    }

    #[tokio::test]
    async fn test_two_clients_exchange_blocks() {
        let addr = relay_server().await;
        let (a, mut a_inbox) = RelayClient::connect(&addr, FrameConfig::default()).await.unwrap();
        let (b, mut b_inbox) = RelayClient::connect(&addr, FrameConfig::default()).await.unwrap();
        assert!(a.is_connected());

        a.send(&join("a")).await.unwrap();
        assert!(matches!(next(&mut a_inbox).await, WireMessage::Players(_)));
        b.send(&join("b")).await.unwrap();
        next(&mut a_inbox).await;
        next(&mut b_inbox).await;

        let change = WireMessage::Block(BlockChange {
            x: 10,
            y: 20,
            z: -30,
            block_type: 8,
        });
        b.send(&change).await.unwrap();
        assert_eq!(next(&mut a_inbox).await, change);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_peers() {
        let addr = relay_server().await;
        let (a, mut a_inbox) = RelayClient::connect(&addr, FrameConfig::default()).await.unwrap();
        let (b, mut b_inbox) = RelayClient::connect(&addr, FrameConfig::default()).await.unwrap();
        a.send(&join("a")).await.unwrap();
        next(&mut a_inbox).await;
        b.send(&join("b")).await.unwrap();
        next(&mut a_inbox).await;
        next(&mut b_inbox).await;

        b.disconnect().await;
        assert!(!b.is_connected());
        assert!(matches!(b.send(&join("b")).await, Err(ClientError::NotConnected)));

        assert!(matches!(
            next(&mut a_inbox).await,
            WireMessage::PlayerLeave(leave) if leave.id == "b"
        ));
    }

    #[tokio::test]
    async fn test_server_drop_marks_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            accept_upgrade(&mut reader, &mut write_half).await.unwrap();
            // Dropping both halves closes the session.
        });

        let (client, mut inbox) = RelayClient::connect(&addr, FrameConfig::default()).await.unwrap();
        let mut state = client.state().subscribe();
        let closed = tokio::time::timeout(
            Duration::from_secs(2),
            state.wait_for(|s| *s == ConnectionState::Disconnected),
        )
        .await
        .is_ok();
        assert!(closed);
        assert!(inbox.recv().await.is_none());
    }
}
