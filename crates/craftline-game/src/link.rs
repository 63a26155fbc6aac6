//! Non-blocking ownership of the relay session for a frame-driven loop.
//!
//! Connecting and reconnecting run on a spawned task; the loop calls
//! [`RelayLink::poll`] once per frame to pick up the outcome, so a dead
//! relay never stalls the frame.

use craftline_net::{
    FrameConfig, ReconnectError, ReconnectPolicy, RelayClient, WireMessage, reconnect_loop,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Session = (RelayClient, mpsc::Receiver<WireMessage>);

/// What changed during a [`RelayLink::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Idle,
    /// A session just opened. The caller should (re)send its join.
    Opened,
    /// The session dropped; reconnection has started.
    Lost,
    /// The reconnect policy ran out of attempts.
    GaveUp,
}

enum LinkState {
    Connected {
        client: RelayClient,
        inbox: mpsc::Receiver<WireMessage>,
    },
    Connecting(JoinHandle<Result<Session, ReconnectError>>),
    Failed,
}

pub struct RelayLink {
    addr: String,
    policy: ReconnectPolicy,
    frame: FrameConfig,
    state: LinkState,
}

impl RelayLink {
    /// Starts connecting to `addr` in the background. The first attempt is
    /// immediate; later ones follow `policy`.
    pub fn connect(addr: impl Into<String>, policy: ReconnectPolicy, frame: FrameConfig) -> Self {
        let mut link = Self {
            addr: addr.into(),
            policy,
            frame,
            state: LinkState::Failed,
        };
        link.state = LinkState::Connecting(link.spawn_attempts(true));
        link
    }

    pub fn is_connected(&self) -> bool {
        matches!(&self.state, LinkState::Connected { client, .. } if client.is_connected())
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, LinkState::Failed)
    }

    /// Advances the connection state machine without waiting on the network.
    pub async fn poll(&mut self) -> LinkEvent {
        let state = std::mem::replace(&mut self.state, LinkState::Failed);
        let (state, event) = match state {
            LinkState::Connected { client, .. } if !client.is_connected() => {
                tracing::warn!("Lost relay session, retrying every {:?}", self.policy.delay);
                (
                    LinkState::Connecting(self.spawn_attempts(false)),
                    LinkEvent::Lost,
                )
            }
            LinkState::Connecting(handle) if handle.is_finished() => match handle.await {
                Ok(Ok((client, inbox))) => {
                    (LinkState::Connected { client, inbox }, LinkEvent::Opened)
                }
                Ok(Err(e)) => {
                    tracing::error!("Relay unreachable: {e}");
                    (LinkState::Failed, LinkEvent::GaveUp)
                }
                Err(e) => {
                    tracing::error!("Connection task failed: {e}");
                    (LinkState::Failed, LinkEvent::GaveUp)
                }
            },
            other => (other, LinkEvent::Idle),
        };
        self.state = state;
        event
    }

    /// Messages received since the last call.
    pub fn drain_inbox(&mut self) -> Vec<WireMessage> {
        let LinkState::Connected { inbox, .. } = &mut self.state else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        while let Ok(message) = inbox.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Sends `messages` in order. Dropped when no session is open.
    pub async fn send_all(&self, messages: &[WireMessage]) {
        let LinkState::Connected { client, .. } = &self.state else {
            return;
        };
        for message in messages {
            if let Err(e) = client.send(message).await {
                tracing::debug!("Dropping {} message: {e}", message.kind());
                break;
            }
        }
    }

    /// Closes the session or abandons a pending connect.
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.state, LinkState::Failed) {
            LinkState::Connected { client, .. } => client.disconnect().await,
            LinkState::Connecting(handle) => handle.abort(),
            LinkState::Failed => {}
        }
    }

    fn spawn_attempts(&self, immediate: bool) -> JoinHandle<Result<Session, ReconnectError>> {
        let addr = self.addr.clone();
        let policy = self.policy.clone();
        let frame = self.frame.clone();
        tokio::spawn(async move {
            if immediate {
                match RelayClient::connect_with_timeout(&addr, frame.clone(), policy.connect_timeout)
                    .await
                {
                    Ok(session) => return Ok(session),
                    Err(e) => tracing::warn!("Could not reach relay at {addr}: {e}"),
                }
            }
            reconnect_loop(&addr, &policy, &frame).await
        })
    }
}
