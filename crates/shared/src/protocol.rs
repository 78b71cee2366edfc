//! Push protocol and REST routes of the monitor backend.
//!
//! The backend pushes JSON objects over `/ws`. Each object is a *fragment*: a
//! subset of the top-level state keys, each mapped to its complete replacement
//! value.

use serde_json::{Map, Value};

/// Path of the push endpoint, relative to the page origin.
pub const WS_PATH: &str = "/ws";

/// Path returning every configured stream's settings.
pub const SETTINGS_PATH: &str = "/stream/settings";

pub const KEY_STREAMS: &str = "streams";
pub const KEY_TRANSCODERS: &str = "transcoders";
pub const KEY_STREAM_TRANSCODERS: &str = "streamTranscoders";
pub const KEY_FANOUTS: &str = "fanouts";
pub const KEY_STREAM_SETTINGS: &str = "streamSettings";

/// Discriminator key that never reaches the store.
pub const KEY_TYPE: &str = "type";

/// Top-level keys the dashboard state understands.
pub const KNOWN_KEYS: [&str; 5] = [
    KEY_STREAMS,
    KEY_TRANSCODERS,
    KEY_STREAM_TRANSCODERS,
    KEY_FANOUTS,
    KEY_STREAM_SETTINGS,
];

/// Partial state update: top-level key to replacement value.
pub type Fragment = Map<String, Value>;

/// Path reading or writing a single stream's settings.
pub fn stream_settings_path(slug: &str) -> String {
    format!("/stream/{}/settings", urlencoding::encode(slug))
}

/// Whether `key` names a field of the dashboard state.
pub fn is_known_key(key: &str) -> bool {
    KNOWN_KEYS.contains(&key)
}

/// Map a page scheme onto the matching websocket scheme.
///
/// Secure pages get a secure socket; anything else falls back to plain `ws`.
pub fn socket_scheme(page_scheme: &str) -> &'static str {
    match page_scheme {
        "https" | "wss" => "wss",
        _ => "ws",
    }
}
