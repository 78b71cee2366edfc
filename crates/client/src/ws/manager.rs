//! The connection task: owns the socket, reconnects on loss and reports
//! lifecycle and data events through a callback.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use stream_monitor_shared::ConnectionError;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::connection::{ConnectionEvent, ConnectionState, ReconnectConfig, WsHandle};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type EventCallback = Arc<dyn Fn(ConnectionEvent) + Send + Sync>;

/// Manages the single push connection to the monitor backend.
pub struct ConnectionManager {
    url: Url,
    reconnect_config: ReconnectConfig,
    state: watch::Sender<ConnectionState>,
    /// Kept so the outbound queue never closes while the task runs.
    sender: mpsc::UnboundedSender<String>,
    receiver: mpsc::UnboundedReceiver<String>,
}

impl ConnectionManager {
    pub fn new(url: Url, reconnect_config: ReconnectConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url,
            reconnect_config,
            state,
            sender,
            receiver,
        }
    }

    /// Get a handle for sending payloads and observing the state
    pub fn handle(&self) -> WsHandle {
        WsHandle::new(
            self.sender.clone(),
            self.state.subscribe(),
            self.url.to_string(),
        )
    }

    /// Start the connection loop in a background tokio task.
    ///
    /// The loop only ends when the task is aborted, or when a bounded
    /// reconnect budget runs out.
    pub fn connect(
        self,
        on_event: impl Fn(ConnectionEvent) + Send + Sync + 'static,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(Arc::new(on_event)))
    }

    async fn run(mut self, on_event: EventCallback) {
        let mut attempt = 0u32;

        loop {
            if attempt == 0 {
                self.state.send_replace(ConnectionState::Connecting);
            } else {
                self.state
                    .send_replace(ConnectionState::Reconnecting { attempt });
            }

            match connect_async(self.url.as_str()).await {
                Ok((socket, _response)) => {
                    attempt = 0;
                    // Anything queued from here on belongs to this connection.
                    self.discard_queued();
                    self.state.send_replace(ConnectionState::Connected);
                    tracing::info!(url = %self.url, "push connection established");
                    on_event(ConnectionEvent::Connected);

                    self.pump(socket, &on_event).await;
                    tracing::info!(url = %self.url, "push connection closed");
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, error = %e, "push connection attempt failed");
                }
            }

            self.state.send_replace(ConnectionState::Disconnected);
            on_event(ConnectionEvent::Disconnected);

            if self.reconnect_config.exhausted(attempt) {
                let reason = ConnectionError::RetriesExhausted { attempts: attempt }.to_string();
                tracing::error!(url = %self.url, "{}", reason);
                self.state.send_replace(ConnectionState::Failed { reason });
                return;
            }

            // Wait before reconnecting
            let delay = self.reconnect_config.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);
            tracing::info!(
                url = %self.url,
                delay_ms = delay.as_millis() as u64,
                attempt,
                "reconnect scheduled"
            );
            on_event(ConnectionEvent::Reconnecting { attempt, delay });
            tokio::time::sleep(delay).await;
        }
    }

    /// Drop payloads queued for a connection that no longer exists.
    fn discard_queued(&mut self) {
        let mut dropped = 0usize;
        while self.receiver.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded payloads queued before connect");
        }
    }

    /// Relay frames in both directions until the connection ends.
    async fn pump(&mut self, socket: Socket, on_event: &EventCallback) {
        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(bytes = text.len(), "push frame received");
                        on_event(ConnectionEvent::Message(text.as_str().to_string()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(url = %self.url, ?frame, "received close frame");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        // Pong is handled automatically by tungstenite
                        tracing::trace!(bytes = data.len(), "received ping");
                    }
                    Some(Ok(_)) => {
                        // Ignore binary, pong, etc.
                    }
                    Some(Err(e)) => {
                        tracing::error!(url = %self.url, error = %e, "push connection read error");
                        break;
                    }
                    None => break,
                },
                payload = self.receiver.recv() => {
                    let Some(payload) = payload else { break };
                    if let Err(e) = write.send(Message::text(payload)).await {
                        tracing::error!(url = %self.url, error = %e, "send failed");
                        break;
                    }
                }
            }
        }
    }
}
