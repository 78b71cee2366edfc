//! Application root: owns the store task and the push connection.

use std::sync::Arc;

use stream_monitor_shared::ConnectionError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api_client::ApiClient;
use crate::config::MonitorConfig;
use crate::dispatcher::ActionDispatcher;
use crate::settings::SettingsApi;
use crate::stores::{DashboardState, Store, StoreHandle};
use crate::ws::{ConnectionManager, WsHandle};

/// A running dashboard core.
///
/// Dropping it stops the store task and the connection loop.
pub struct Dashboard {
    store: StoreHandle,
    dispatcher: ActionDispatcher,
    socket: WsHandle,
    tasks: Vec<JoinHandle<()>>,
}

impl Dashboard {
    /// Start against the REST API at the configured base URL.
    pub fn start(config: &MonitorConfig) -> Result<Self, ConnectionError> {
        let api = ApiClient::new().with_base_url(config.origin());
        Self::start_with(config, Store::new(), Arc::new(api))
    }

    /// Start with a prepared store (subscribers already registered) and a
    /// settings backend. Must be called inside a tokio runtime.
    pub fn start_with(
        config: &MonitorConfig,
        store: Store,
        settings: Arc<dyn SettingsApi>,
    ) -> Result<Self, ConnectionError> {
        let ws_url = config.ws_url()?;

        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let store_handle = store.handle();
        let store_task = tokio::spawn(store.run(actions_rx));

        let dispatcher = ActionDispatcher::new(actions_tx, settings);

        let manager = ConnectionManager::new(ws_url.clone(), config.reconnect.clone());
        let socket = manager.handle();
        let events = dispatcher.clone();
        let connection_task = manager.connect(move |event| events.handle_connection_event(event));

        tracing::info!(url = %ws_url, "dashboard started");

        Ok(Self {
            store: store_handle,
            dispatcher,
            socket,
            tasks: vec![connection_task, store_task],
        })
    }

    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    /// Latest state snapshot.
    pub fn state(&self) -> Arc<DashboardState> {
        self.store.snapshot()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn socket(&self) -> &WsHandle {
        &self.socket
    }

    /// Stop the connection and store tasks and wait for them to finish.
    pub async fn shutdown(mut self) {
        self.dispatcher.invalidate_pending();
        for task in self.tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }
        tracing::info!("dashboard stopped");
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
