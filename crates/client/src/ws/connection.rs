//! Connection state, reconnect policy and the send handle of the push socket.

use std::time::Duration;

use stream_monitor_shared::ConnectionError;
use tokio::sync::{mpsc, watch};

/// Connection state for the push socket
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    /// Only reachable when [`ReconnectConfig::max_attempts`] is non-zero.
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }
}

/// Lifecycle and data events emitted by the connection task, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Handshake completed.
    Connected,
    /// One inbound text frame, undecoded.
    Message(String),
    /// The connection closed or a connection attempt failed.
    Disconnected,
    /// A reconnect attempt has been scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
}

/// Configuration for auto-reconnect behavior
///
/// The default retries forever, once per second.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive reconnect attempts (0 = infinite)
    pub max_attempts: u32,
    /// Delay before the first reconnect attempt, in milliseconds
    pub initial_delay_ms: u32,
    /// Upper bound for the delay, in milliseconds
    pub max_delay_ms: u32,
    /// Multiplier for exponential backoff (1.0 = fixed delay)
    pub backoff_multiplier: f32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 1.0,
        }
    }
}

impl ReconnectConfig {
    /// Fixed-delay policy retrying forever.
    pub fn fixed(delay_ms: u32) -> Self {
        Self {
            initial_delay_ms: delay_ms,
            ..Self::default()
        }
    }

    /// Delay before reconnect attempt `attempt + 1`, where `attempt` counts
    /// the consecutive failures so far.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = if self.backoff_multiplier.is_finite() && self.backoff_multiplier > 1.0 {
            f64::from(self.backoff_multiplier)
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = f64::from(self.initial_delay_ms) * multiplier.powi(exponent);
        let capped = delay.min(f64::from(self.max_delay_ms.max(self.initial_delay_ms)));
        Duration::from_millis(capped as u64)
    }

    /// Whether `attempts` consecutive failed reconnects exhaust the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts > 0 && attempts >= self.max_attempts
    }
}

/// Handle for sending payloads through the push socket
#[derive(Clone)]
pub struct WsHandle {
    sender: mpsc::UnboundedSender<String>,
    state: watch::Receiver<ConnectionState>,
    pub url: String,
}

impl WsHandle {
    pub(crate) fn new(
        sender: mpsc::UnboundedSender<String>,
        state: watch::Receiver<ConnectionState>,
        url: String,
    ) -> Self {
        Self { sender, state, url }
    }

    /// Forward a payload to the live connection.
    ///
    /// Nothing is queued while disconnected: the payload is dropped and
    /// [`ConnectionError::NotConnected`] returned.
    pub fn send(&self, payload: impl Into<String>) -> Result<(), ConnectionError> {
        if !self.state.borrow().is_connected() {
            tracing::debug!(url = %self.url, "send while disconnected, payload dropped");
            return Err(ConnectionError::NotConnected);
        }
        self.sender
            .send(payload.into())
            .map_err(|e| ConnectionError::Transport(format!("Failed to send: {}", e)))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_fixed_one_second_forever() {
        let config = ReconnectConfig::default();
        for attempt in [0, 1, 5, 100, u32::MAX] {
            assert_eq!(config.delay_for_attempt(attempt), Duration::from_millis(1000));
            assert!(!config.exhausted(attempt));
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconnectConfig {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(config.delay_for_attempt(60), Duration::from_millis(350));
        assert!(!config.exhausted(2));
        assert!(config.exhausted(3));
    }

    #[test]
    fn shrinking_multiplier_is_treated_as_fixed() {
        let config = ReconnectConfig {
            backoff_multiplier: 0.5,
            ..ReconnectConfig::fixed(250)
        };
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(250));
    }

    #[test]
    fn send_while_disconnected_is_a_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let handle = WsHandle::new(tx, state_rx, "ws://localhost/ws".into());

        assert_eq!(handle.send("hello"), Err(ConnectionError::NotConnected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn send_while_connected_is_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let handle = WsHandle::new(tx, state_rx, "ws://localhost/ws".into());

        handle.send("hello").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }
}
