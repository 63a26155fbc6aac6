//! World relay: routes session messages between connected players.
//!
//! The relay keeps no world state. It tracks who has joined and where they
//! are, answers joins with the roster, and forwards moves and block changes
//! to everyone else.
//!
//! All registry mutation happens on one task. Connection tasks feed it
//! [`RelayEvent`]s through an mpsc channel, and it pushes encoded JSON to each
//! session's outbox. Fan-out is best-effort: a full or closed outbox drops
//! that one delivery and the rest still go out.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::messages::{
    Join, Move, PlayerEntry, PlayerLeave, PlayerMove, Roster, WireMessage, encode_message,
};
use crate::tcp_server::ConnectionId;

/// Per-session queue of encoded JSON payloads awaiting a text frame.
pub type Outbox = mpsc::Sender<Arc<str>>;

/// Capacity of each session's outbox.
pub const OUTBOX_CAPACITY: usize = 256;

/// Capacity of the relay's inbound event queue.
pub const EVENT_CAPACITY: usize = 1024;

/// Input to the relay task.
#[derive(Debug)]
pub enum RelayEvent {
    /// A session finished its handshake.
    Connected { conn: ConnectionId, outbox: Outbox },
    /// A decoded message arrived from a session.
    Message {
        conn: ConnectionId,
        message: WireMessage,
    },
    /// A `block` message arrived; `payload` is the sender's JSON text.
    Block {
        conn: ConnectionId,
        payload: Arc<str>,
    },
    /// A session closed, cleanly or not.
    Disconnected { conn: ConnectionId },
}

#[derive(Debug)]
struct Session {
    outbox: Outbox,
    /// `None` until the session sends `join`.
    player: Option<PlayerEntry>,
}

/// Live sessions keyed by connection.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: FxHashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connected sessions, joined or not.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn joined_count(&self) -> usize {
        self.sessions.values().filter(|s| s.player.is_some()).count()
    }

    pub fn player(&self, conn: ConnectionId) -> Option<&PlayerEntry> {
        self.sessions.get(&conn)?.player.as_ref()
    }

    /// Joined players in connection order.
    pub fn roster(&self) -> Roster {
        let mut joined: Vec<_> = self
            .sessions
            .iter()
            .filter_map(|(conn, session)| session.player.as_ref().map(|p| (*conn, p.clone())))
            .collect();
        joined.sort_by_key(|(conn, _)| *conn);
        Roster {
            players: joined.into_iter().map(|(_, player)| player).collect(),
        }
    }

    /// Applies one event.
    pub fn handle(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected { conn, outbox } => {
                tracing::debug!("Session {conn:?} registered");
                self.sessions.insert(
                    conn,
                    Session {
                        outbox,
                        player: None,
                    },
                );
            }
            RelayEvent::Message { conn, message } => self.on_message(conn, message),
            RelayEvent::Block { conn, payload } => self.on_block(conn, payload),
            RelayEvent::Disconnected { conn } => self.on_disconnect(conn),
        }
    }

    fn on_message(&mut self, conn: ConnectionId, message: WireMessage) {
        match message {
            WireMessage::Join(join) => self.on_join(conn, join),
            WireMessage::Move(mv) => self.on_move(conn, mv),
            WireMessage::Block(change) => match encode_message(&WireMessage::Block(change)) {
                Ok(text) => self.on_block(conn, text.into()),
                Err(e) => tracing::warn!("Failed to encode block: {e}"),
            },
            other @ (WireMessage::PlayerMove(_)
            | WireMessage::Players(_)
            | WireMessage::PlayerLeave(_)) => {
                tracing::debug!("Ignoring server-only {:?} from {conn:?}", other.kind());
            }
        }
    }

    fn on_join(&mut self, conn: ConnectionId, join: Join) {
        if !self.sessions.contains_key(&conn) {
            return;
        }

        // A player id belongs to one session; a newer join takes it over.
        for (other, session) in self.sessions.iter_mut() {
            if *other != conn && session.player.as_ref().is_some_and(|p| p.id == join.id) {
                tracing::debug!("Player id {:?} moved from {other:?} to {conn:?}", join.id);
                session.player = None;
            }
        }

        let [x, y, z] = join.position();
        let player = PlayerEntry {
            id: join.id,
            name: join.name,
            x,
            y,
            z,
        };
        tracing::info!("Player joined: {} ({})", player.name, player.id);
        if let Some(session) = self.sessions.get_mut(&conn) {
            session.player = Some(player);
        }

        self.broadcast(&WireMessage::Players(self.roster()), None);
    }

    fn on_move(&mut self, conn: ConnectionId, mv: Move) {
        let Some(player) = self.sessions.get_mut(&conn).and_then(|s| s.player.as_mut()) else {
            tracing::trace!("Move from unjoined session {conn:?} ignored");
            return;
        };
        player.x = mv.x;
        player.y = mv.y;
        player.z = mv.z;

        let update = WireMessage::PlayerMove(PlayerMove {
            id: player.id.clone(),
            x: mv.x,
            y: mv.y,
            z: mv.z,
        });
        self.broadcast(&update, Some(conn));
    }

    fn on_block(&mut self, conn: ConnectionId, payload: Arc<str>) {
        self.broadcast_payload(payload, "block", Some(conn));
    }

    fn on_disconnect(&mut self, conn: ConnectionId) {
        let Some(session) = self.sessions.remove(&conn) else {
            return;
        };
        let Some(player) = session.player else {
            tracing::debug!("Session {conn:?} closed before joining");
            return;
        };

        tracing::info!("Player left: {} ({})", player.name, player.id);
        self.broadcast(&WireMessage::PlayerLeave(PlayerLeave { id: player.id }), None);
        self.broadcast(&WireMessage::Players(self.roster()), None);
    }

    /// Sends `msg` to every joined session except `except`. Returns the
    /// number of outboxes that accepted it.
    pub fn broadcast(&self, msg: &WireMessage, except: Option<ConnectionId>) -> usize {
        match encode_message(msg) {
            Ok(text) => self.broadcast_payload(text.into(), msg.kind(), except),
            Err(e) => {
                tracing::warn!("Failed to encode {}: {e}", msg.kind());
                0
            }
        }
    }

    /// [`broadcast`](Self::broadcast) for an already-encoded payload.
    pub fn broadcast_payload(
        &self,
        payload: Arc<str>,
        kind: &str,
        except: Option<ConnectionId>,
    ) -> usize {
        let mut delivered = 0;
        for (conn, session) in &self.sessions {
            if Some(*conn) == except || session.player.is_none() {
                continue;
            }
            match session.outbox.try_send(Arc::clone(&payload)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!("Outbox of {conn:?} full, dropping {kind}");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!("Outbox of {conn:?} closed");
                }
            }
        }
        delivered
    }
}

// ---------------------------------------------------------------------------
// Relay task
// ---------------------------------------------------------------------------

/// Cloneable sender side of the relay task.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayEvent>,
}

impl RelayHandle {
    /// Queues an event. Returns `false` once the relay has stopped.
    pub async fn send(&self, event: RelayEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

/// Owns the [`SessionRegistry`] and applies events one at a time.
pub struct WorldRelay {
    registry: SessionRegistry,
    events: mpsc::Receiver<RelayEvent>,
}

impl WorldRelay {
    pub fn new(capacity: usize) -> (Self, RelayHandle) {
        let (tx, events) = mpsc::channel(capacity);
        let relay = Self {
            registry: SessionRegistry::new(),
            events,
        };
        (relay, RelayHandle { tx })
    }

    /// Runs until every [`RelayHandle`] is dropped, then returns the registry.
    pub async fn run(mut self) -> SessionRegistry {
        while let Some(event) = self.events.recv().await {
            self.registry.handle(event);
        }
        tracing::debug!("Relay stopped");
        self.registry
    }

    /// Spawns the relay onto the current runtime.
    pub fn spawn(capacity: usize) -> (RelayHandle, JoinHandle<SessionRegistry>) {
        let (relay, handle) = Self::new(capacity);
        (handle, tokio::spawn(relay.run()))
    }
}
