//! Named mutation intents applied by the store.

use stream_monitor_shared::{FetchError, Fragment, StreamSettings};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace every top-level field named in the fragment.
    UpdateState(Fragment),
    SocketConnected,
    SocketDisconnected,
    /// Full settings list from the settings endpoint, in server order.
    UpdatedStreamSettings(Vec<StreamSettings>),
    /// Canonical settings returned after a successful write.
    SetStreamSettings(StreamSettings),
    /// A settings request failed.
    FetchError(FetchError),
}

impl Action {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::UpdateState(_) => "UPDATE_STATE",
            Action::SocketConnected => "SOCKET_CONNECTED",
            Action::SocketDisconnected => "SOCKET_DISCONNECTED",
            Action::UpdatedStreamSettings(_) => "UPDATED_STREAM_SETTINGS",
            Action::SetStreamSettings(_) => "SET_STREAM_SETTINGS",
            Action::FetchError(_) => "FETCH_ERROR",
        }
    }
}
