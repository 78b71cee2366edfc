//! The normalized dashboard state.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stream_monitor_shared::{
    Fanout, Stream, StreamSettings, Transcoder, KEY_FANOUTS, KEY_STREAMS, KEY_STREAM_SETTINGS,
    KEY_STREAM_TRANSCODERS, KEY_TRANSCODERS,
};
use thiserror::Error;

/// Key of the connection flag. Only lifecycle actions may change it.
pub const KEY_SOCKET_CONNECTED: &str = "socketConnected";

/// Everything the views render, keyed the way the backend pushes it.
///
/// The typed maps are views over the last pushed value of each key. Entities
/// that do not fit their type are left out of the view but kept in the pushed
/// value, which [`DashboardState::field`] returns unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    /// slug → stream
    pub streams: BTreeMap<String, Stream>,
    /// name → transcoder
    pub transcoders: BTreeMap<String, Transcoder>,
    /// stream slug → transcoder name
    pub stream_transcoders: BTreeMap<String, String>,
    /// name → fanout
    pub fanouts: BTreeMap<String, Fanout>,
    /// slug → settings
    pub stream_settings: BTreeMap<String, StreamSettings>,
    pub socket_connected: bool,
    /// Top-level keys pushed by the backend that the dashboard does not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Known keys as last pushed, verbatim.
    #[serde(skip)]
    pushed: BTreeMap<String, Value>,
}

/// Why a fragment value could not be applied to its field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("field is not writable by fragments")]
    Reserved,
}

impl DashboardState {
    /// Replace one top-level field wholesale with a pushed value.
    ///
    /// The value is kept as sent. `null` clears a known field's view.
    pub fn replace_field(&mut self, key: &str, value: &Value) -> Result<(), FieldError> {
        match key {
            KEY_STREAMS => self.streams = entities(key, value),
            KEY_TRANSCODERS => self.transcoders = entities(key, value),
            KEY_STREAM_TRANSCODERS => self.stream_transcoders = entities(key, value),
            KEY_FANOUTS => self.fanouts = entities(key, value),
            KEY_STREAM_SETTINGS => self.stream_settings = entities(key, value),
            KEY_SOCKET_CONNECTED => return Err(FieldError::Reserved),
            other => {
                self.extra.insert(other.to_string(), value.clone());
                return Ok(());
            }
        }
        self.pushed.insert(key.to_string(), value.clone());
        Ok(())
    }

    /// Replace the settings map from the settings endpoint.
    pub fn set_stream_settings(&mut self, settings: BTreeMap<String, StreamSettings>) {
        self.stream_settings = settings;
        self.pushed.remove(KEY_STREAM_SETTINGS);
    }

    /// JSON view of one top-level field, as a fragment would carry it.
    pub fn field(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.pushed.get(key) {
            return Some(value.clone());
        }
        match key {
            KEY_STREAMS => serde_json::to_value(&self.streams).ok(),
            KEY_TRANSCODERS => serde_json::to_value(&self.transcoders).ok(),
            KEY_STREAM_TRANSCODERS => serde_json::to_value(&self.stream_transcoders).ok(),
            KEY_FANOUTS => serde_json::to_value(&self.fanouts).ok(),
            KEY_STREAM_SETTINGS => serde_json::to_value(&self.stream_settings).ok(),
            KEY_SOCKET_CONNECTED => Some(Value::Bool(self.socket_connected)),
            other => self.extra.get(other).cloned(),
        }
    }
}

/// Typed view of a pushed map. Entries that do not decode are left out.
fn entities<T: DeserializeOwned>(key: &str, value: &Value) -> BTreeMap<String, T> {
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return BTreeMap::new(),
        other => {
            tracing::warn!(key, value = %other, "pushed field is not a map");
            return BTreeMap::new();
        }
    };

    map.iter()
        .filter_map(|(id, entity)| match serde_json::from_value(entity.clone()) {
            Ok(entity) => Some((id.clone(), entity)),
            Err(e) => {
                tracing::warn!(key, id = %id, error = %e, "entity left out of view");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_clears_a_known_field() {
        let mut state = DashboardState::default();
        state
            .fanouts
            .insert("f1".into(), Fanout::new("f1", "icecast://sink"));
        state.replace_field("fanouts", &Value::Null).unwrap();
        assert!(state.fanouts.is_empty());
        assert_eq!(state.field("fanouts"), Some(Value::Null));
    }

    #[test]
    fn one_bad_entity_does_not_drop_its_siblings() {
        let mut state = DashboardState::default();
        let pushed = json!({"cam1": "t1", "cam2": 5});
        state.replace_field("streamTranscoders", &pushed).unwrap();

        assert_eq!(state.stream_transcoders.len(), 1);
        assert_eq!(
            state.stream_transcoders.get("cam1").map(String::as_str),
            Some("t1")
        );
        assert_eq!(state.field("streamTranscoders"), Some(pushed));
    }

    #[test]
    fn non_map_value_is_kept_verbatim() {
        let mut state = DashboardState::default();
        state.replace_field("streams", &json!("oops")).unwrap();
        assert!(state.streams.is_empty());
        assert_eq!(state.field("streams"), Some(json!("oops")));
    }

    #[test]
    fn connection_flag_is_reserved() {
        let mut state = DashboardState::default();
        assert!(matches!(
            state.replace_field("socketConnected", &json!(true)),
            Err(FieldError::Reserved)
        ));
        assert!(!state.socket_connected);
    }

    #[test]
    fn unknown_keys_pass_through() {
        let mut state = DashboardState::default();
        state.replace_field("relays", &json!({"r1": {}})).unwrap();
        assert_eq!(state.field("relays"), Some(json!({"r1": {}})));
        assert_eq!(
            serde_json::to_value(&state).unwrap()["relays"],
            json!({"r1": {}})
        );
    }

    #[test]
    fn settings_from_the_api_replace_a_pushed_value() {
        let mut state = DashboardState::default();
        state
            .replace_field("streamSettings", &json!({"a": {"slug": "a", "notes": "old"}}))
            .unwrap();

        let mut fresh = BTreeMap::new();
        fresh.insert("b".to_string(), StreamSettings::new("b"));
        state.set_stream_settings(fresh);

        assert_eq!(state.field("streamSettings"), Some(json!({"b": {"slug": "b"}})));
    }
}
