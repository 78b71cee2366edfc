//! Turns connection events and REST results into store actions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stream_monitor_shared::{ApiError, StreamSettings};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actions::Action;
use crate::decoder::decode_frame;
use crate::settings::SettingsApi;
use crate::ws::ConnectionEvent;

/// Generation of in-flight REST requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(u64);

/// Only producer of store actions.
///
/// Every action goes onto one ordered channel read by the store task, so the
/// store applies them in the order they were dispatched here.
#[derive(Clone)]
pub struct ActionDispatcher {
    actions: mpsc::UnboundedSender<Action>,
    settings: Arc<dyn SettingsApi>,
    /// Held while a response is checked and dispatched, so no stale action
    /// can be enqueued once `invalidate_pending` has returned.
    epoch: Arc<Mutex<u64>>,
}

impl ActionDispatcher {
    pub fn new(actions: mpsc::UnboundedSender<Action>, settings: Arc<dyn SettingsApi>) -> Self {
        Self {
            actions,
            settings,
            epoch: Arc::new(Mutex::new(0)),
        }
    }

    pub fn dispatch(&self, action: Action) {
        let name = action.name();
        if self.actions.send(action).is_err() {
            tracing::debug!(action = name, "store is gone, action dropped");
        }
    }

    /// Feed one event from the connection manager into the store.
    pub fn handle_connection_event(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => self.dispatch(Action::SocketConnected),
            ConnectionEvent::Disconnected => self.dispatch(Action::SocketDisconnected),
            ConnectionEvent::Message(raw) => {
                if let Some(fragment) = decode_frame(&raw) {
                    self.dispatch(Action::UpdateState(fragment));
                }
            }
            ConnectionEvent::Reconnecting { attempt, delay } => {
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
            }
        }
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn epoch(&self) -> Epoch {
        Epoch(*self.lock_epoch())
    }

    /// Responses to requests issued before this call are discarded.
    pub fn invalidate_pending(&self) -> Epoch {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        Epoch(*epoch)
    }

    /// Load every stream's settings into the store.
    pub fn fetch_all_settings(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.settings);
        self.spawn_request("fetch_all_settings", async move {
            api.fetch_all_settings()
                .await
                .map(Action::UpdatedStreamSettings)
        })
    }

    /// Write one stream's settings; the canonical result is dispatched as
    /// [`Action::SetStreamSettings`].
    pub fn submit_settings(&self, settings: StreamSettings) -> JoinHandle<()> {
        let api = Arc::clone(&self.settings);
        self.spawn_request("submit_settings", async move {
            api.submit_settings(&settings)
                .await
                .map(Action::SetStreamSettings)
        })
    }

    /// Re-read one stream's settings.
    pub fn load_stream_settings(&self, slug: impl Into<String>) -> JoinHandle<()> {
        let api = Arc::clone(&self.settings);
        let slug = slug.into();
        self.spawn_request("load_stream_settings", async move {
            api.fetch_settings(&slug).await.map(Action::SetStreamSettings)
        })
    }

    fn spawn_request<F>(&self, request: &'static str, fut: F) -> JoinHandle<()>
    where
        F: std::future::Future<Output = Result<Action, ApiError>> + Send + 'static,
    {
        let issued = self.epoch();
        let this = self.clone();
        tokio::spawn(async move {
            let result = fut.await;

            let current = this.lock_epoch();
            if Epoch(*current) != issued {
                tracing::debug!(request, "stale response dropped");
                return;
            }

            match result {
                Ok(action) => this.dispatch(action),
                Err(e) => {
                    tracing::error!(request, error = %e, "settings request failed");
                    this.dispatch(Action::FetchError(e));
                }
            }
        })
    }
}
