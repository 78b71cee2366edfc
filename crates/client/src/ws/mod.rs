//! Push connection to the monitor backend.
//!
//! This module provides:
//! - A connection task with auto-reconnect (fixed one second delay, forever,
//!   unless configured otherwise)
//! - A cloneable [`WsHandle`] for sending and observing the connection state
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  ConnectionEvent   ┌──────────────────┐  Action  ┌─────────────┐
//! │  ConnectionManager   │ ─────────────────▶ │ ActionDispatcher │ ───────▶ │ Store task  │
//! │ (owns the socket)    │   (callback)       │  (decodes frames)│ (mpsc)   │ (reducer)   │
//! └──────────────────────┘                    └──────────────────┘          └─────────────┘
//! ```
//!
//! The manager never touches the store itself; it only reports events in
//! arrival order.

mod connection;
mod manager;

pub use connection::{ConnectionEvent, ConnectionState, ReconnectConfig, WsHandle};
pub use manager::ConnectionManager;
