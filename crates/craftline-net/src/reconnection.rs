//! Client-side reconnection on a fixed delay.
//!
//! After a lost session the client waits [`ReconnectPolicy::delay`] and tries
//! again, for as many attempts as the policy allows (unbounded by default).

use std::time::Duration;

use tokio::sync::mpsc;

use crate::framing::FrameConfig;
use crate::handshake::DEFAULT_HANDSHAKE_TIMEOUT;
use crate::messages::WireMessage;
use crate::tcp_client::RelayClient;

/// How often and how many times to retry a lost connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before each attempt. Default: 3 s.
    pub delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Limit on each attempt's connect and upgrade. Default: 10 s.
    pub connect_timeout: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: None,
            connect_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

/// Attempt counter for one outage.
#[derive(Debug)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are used up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.policy.max_attempts.is_some_and(|max| self.attempts >= max) {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        Some(self.policy.delay)
    }

    /// Call after a successful reconnect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconnectError {
    #[error("gave up after {attempts} reconnection attempts")]
    MaxAttemptsExhausted { attempts: u32 },
}

/// Retries [`RelayClient::connect`] under `policy` until it succeeds.
pub async fn reconnect_loop(
    addr: &str,
    policy: &ReconnectPolicy,
    frame: &FrameConfig,
) -> Result<(RelayClient, mpsc::Receiver<WireMessage>), ReconnectError> {
    let mut state = ReconnectState::new(policy.clone());

    loop {
        let Some(delay) = state.next_delay() else {
            return Err(ReconnectError::MaxAttemptsExhausted {
                attempts: state.attempts(),
            });
        };
        tracing::info!("Reconnection attempt {} in {:?}", state.attempts(), delay);
        tokio::time::sleep(delay).await;

        match RelayClient::connect_with_timeout(addr, frame.clone(), policy.connect_timeout).await {
            Ok(session) => {
                tracing::info!("Reconnected after {} attempts", state.attempts());
                return Ok(session);
            }
            Err(e) => {
                tracing::warn!("Reconnection attempt {} failed: {e}", state.attempts());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::net::TcpListener;

    use crate::relay::{EVENT_CAPACITY, WorldRelay};
    use crate::tcp_server::{RelayServer, ServerConfig};

    fn quick(max_attempts: Option<u32>) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(20),
            max_attempts,
            connect_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_default_is_three_seconds_unbounded() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, None);

        let mut state = ReconnectState::new(policy);
        for _ in 0..1000 {
            assert_eq!(state.next_delay(), Some(Duration::from_secs(3)));
        }
        assert_eq!(state.attempts(), 1000);
    }

    #[test]
    fn test_delay_is_fixed_and_capped() {
        let mut state = ReconnectState::new(quick(Some(2)));
        assert_eq!(state.next_delay(), Some(Duration::from_millis(20)));
        assert_eq!(state.next_delay(), Some(Duration::from_millis(20)));
        assert_eq!(state.next_delay(), None);

        state.reset();
        assert_eq!(state.attempts(), 0);
        assert!(state.next_delay().is_some());
    }

    #[tokio::test]
    async fn test_gives_up_when_server_absent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = reconnect_loop(&addr, &quick(Some(2)), &FrameConfig::default()).await;
        assert!(matches!(
            result,
            Err(ReconnectError::MaxAttemptsExhausted { attempts: 2 })
        ));
    }

    #[tokio::test]
    async fn test_silent_server_counts_as_failed_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            reconnect_loop(&addr, &quick(Some(2)), &FrameConfig::default()),
        )
        .await
        .expect("reconnect loop hung");
        assert!(matches!(
            result,
            Err(ReconnectError::MaxAttemptsExhausted { attempts: 2 })
        ));
    }

    #[tokio::test]
    async fn test_reconnects_once_server_is_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (relay, _task) = WorldRelay::spawn(EVENT_CAPACITY);
        let server = Arc::new(RelayServer::new(ServerConfig::default(), relay));
        tokio::spawn(async move {
            server.run_with_listener(listener).await.unwrap();
        });

        let (client, _inbox) = reconnect_loop(&addr, &quick(Some(3)), &FrameConfig::default())
            .await
            .unwrap();
        assert!(client.is_connected());
    }
}
