//! Stream Monitor client core
//!
//! Keeps a live view of the streaming pipeline (streams, transcoders,
//! fanouts, per-stream settings) in sync with the monitor backend: a push
//! socket feeds state fragments, REST calls read and write settings, and a
//! single store task applies every change in order.

pub mod actions;
pub mod api_client;
pub mod config;
pub mod dashboard;
pub mod decoder;
pub mod dispatcher;
pub mod logging;
pub mod settings;
pub mod stores;
pub mod ws;

pub use actions::Action;
pub use api_client::ApiClient;
pub use config::MonitorConfig;
pub use dashboard::Dashboard;
pub use dispatcher::{ActionDispatcher, Epoch};
pub use settings::{generate_secret, SettingsApi};
pub use stores::{DashboardState, Store, StoreHandle};
pub use ws::{ConnectionEvent, ConnectionManager, ConnectionState, ReconnectConfig, WsHandle};
