//! The pure transition function of the dashboard store.
//!
//! Fragments replace top-level fields wholesale; nothing is merged below the
//! top level. An empty `fanouts` map in a fragment therefore clears fanouts.

use std::sync::Arc;

use stream_monitor_shared::{is_known_key, Fragment, StreamSettings, KEY_TYPE};

use super::state::DashboardState;
use crate::actions::Action;

/// Apply `action` to `state`.
///
/// Actions without an effect return the very same `Arc`, so callers can tell
/// "nothing changed" apart with [`Arc::ptr_eq`].
pub fn reduce(state: Arc<DashboardState>, action: &Action) -> Arc<DashboardState> {
    match action {
        Action::UpdateState(fragment) => apply_fragment(state, fragment),
        Action::SocketConnected => set_socket_connected(state, true),
        Action::SocketDisconnected => set_socket_connected(state, false),
        Action::UpdatedStreamSettings(list) => replace_settings(&state, list),
        // Observable through subscribers, no effect on the state shape.
        Action::SetStreamSettings(_) | Action::FetchError(_) => state,
    }
}

fn apply_fragment(state: Arc<DashboardState>, fragment: &Fragment) -> Arc<DashboardState> {
    let mut next: Option<DashboardState> = None;

    for (key, value) in fragment.iter().filter(|(key, _)| key.as_str() != KEY_TYPE) {
        if !is_known_key(key) {
            tracing::debug!(key = %key, "unmodelled fragment key kept as-is");
        }
        let target = next.get_or_insert_with(|| DashboardState::clone(&state));
        if let Err(e) = target.replace_field(key, value) {
            tracing::warn!(key = %key, error = %e, "fragment key skipped");
        }
    }

    next.map(Arc::new).unwrap_or(state)
}

fn set_socket_connected(state: Arc<DashboardState>, connected: bool) -> Arc<DashboardState> {
    if state.socket_connected == connected {
        return state;
    }
    let mut next = DashboardState::clone(&state);
    next.socket_connected = connected;
    Arc::new(next)
}

fn replace_settings(state: &DashboardState, list: &[StreamSettings]) -> Arc<DashboardState> {
    let mut next = state.clone();
    next.set_stream_settings(
        list.iter()
            .map(|settings| (settings.slug.clone(), settings.clone()))
            .collect(),
    );
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use stream_monitor_shared::{ApiError, Fanout, Stream, Transcoder};

    fn fragment(value: Value) -> Fragment {
        match value {
            Value::Object(map) => map,
            _ => panic!("fragment must be an object"),
        }
    }

    fn populated() -> Arc<DashboardState> {
        let mut state = DashboardState::default();
        state
            .streams
            .insert("cam1".into(), Stream::new("cam1", "rtmp", "rtmp://x"));
        state.transcoders.insert(
            "t1".into(),
            Transcoder::new("t1", 4, vec!["cam1".into()]),
        );
        state.stream_transcoders.insert("cam1".into(), "t1".into());
        state
            .fanouts
            .insert("f1".into(), Fanout::new("f1", "icecast://sink"));
        state.socket_connected = true;
        Arc::new(state)
    }

    #[test]
    fn fragment_keys_replace_and_others_stay() {
        let before = populated();
        let f = fragment(json!({
            "transcoders": {
                "t2": {"name": "t2", "capacity": 2, "streams": []}
            },
            "streamTranscoders": {}
        }));
        let after = reduce(before.clone(), &Action::UpdateState(f.clone()));

        for (key, value) in &f {
            assert_eq!(after.field(key).as_ref(), Some(value), "key {key}");
        }
        for key in ["streams", "fanouts", "streamSettings", "socketConnected"] {
            assert_eq!(after.field(key), before.field(key), "key {key}");
        }
    }

    #[test]
    fn replace_is_not_a_merge() {
        let before = populated();
        let f = fragment(json!({
            "streams": {"cam2": {"slug": "cam2", "format": "srt", "source": "srt://y"}},
            "fanouts": {}
        }));
        let after = reduce(before, &Action::UpdateState(f));

        assert_eq!(after.streams.keys().collect::<Vec<_>>(), vec!["cam2"]);
        assert!(after.fanouts.is_empty());
    }

    #[test]
    fn type_key_never_reaches_the_store() {
        let before = populated();
        let after = reduce(
            before.clone(),
            &Action::UpdateState(fragment(json!({"type": "UPDATE_STATE"}))),
        );
        assert!(Arc::ptr_eq(&before, &after));
        assert!(after.extra.is_empty());
    }

    #[test]
    fn malformed_key_is_stored_as_sent() {
        let before = populated();
        let f = fragment(json!({"streams": "oops", "fanouts": {}}));
        let after = reduce(before, &Action::UpdateState(f));

        assert_eq!(after.field("streams"), Some(json!("oops")));
        assert!(after.streams.is_empty());
        assert!(after.fanouts.is_empty());
    }

    #[test]
    fn backend_transcoder_status_applies() {
        let before = populated();
        let f = fragment(json!({
            "transcoders": {"t1": {"name": "t1", "capacity": 4, "streams": 2}}
        }));
        let after = reduce(before, &Action::UpdateState(f.clone()));

        assert_eq!(after.field("transcoders").as_ref(), f.get("transcoders"));
        let t1 = &after.transcoders["t1"];
        assert_eq!(t1.streams.len(), 2);
        assert_eq!(t1.capacity, 4);
    }

    #[test]
    fn partial_entities_are_not_filled_in() {
        let f = fragment(json!({"streams": {"cam1": {"slug": "cam1"}}}));
        let after = reduce(Arc::new(DashboardState::default()), &Action::UpdateState(f));

        assert_eq!(after.field("streams"), Some(json!({"cam1": {"slug": "cam1"}})));
        assert_eq!(
            serde_json::to_value(&after.streams).unwrap(),
            json!({"cam1": {"slug": "cam1"}})
        );
    }

    #[test]
    fn one_bad_entity_keeps_the_rest_of_the_key() {
        let f = fragment(json!({
            "transcoders": {
                "t1": {"name": "t1", "capacity": 4, "streams": 1},
                "t2": {"name": "t2", "capacity": "lots"}
            }
        }));
        let after = reduce(Arc::new(DashboardState::default()), &Action::UpdateState(f.clone()));

        assert_eq!(after.transcoders.keys().collect::<Vec<_>>(), vec!["t1"]);
        assert_eq!(after.field("transcoders").as_ref(), f.get("transcoders"));
    }

    #[test]
    fn socket_flags_are_idempotent() {
        let state = Arc::new(DashboardState::default());
        let connected = reduce(state, &Action::SocketConnected);
        assert!(connected.socket_connected);
        let again = reduce(connected.clone(), &Action::SocketConnected);
        assert!(again.socket_connected);
        assert!(Arc::ptr_eq(&connected, &again));

        let disconnected = reduce(again, &Action::SocketDisconnected);
        assert!(!disconnected.socket_connected);
        let again = reduce(disconnected, &Action::SocketDisconnected);
        assert!(!again.socket_connected);
    }

    #[test]
    fn socket_flag_touches_nothing_else() {
        let before = populated();
        let after = reduce(before.clone(), &Action::SocketDisconnected);
        let mut restored = DashboardState::clone(&after);
        restored.socket_connected = true;
        assert_eq!(restored, *before);
    }

    #[test]
    fn settings_list_replaces_the_whole_map() {
        let mut state = DashboardState::default();
        state
            .stream_settings
            .insert("old".into(), StreamSettings::new("old"));
        let list = vec![
            StreamSettings::new("a").with_secret("k1"),
            StreamSettings::new("b").with_ingest_type("relay"),
        ];
        let after = reduce(Arc::new(state), &Action::UpdatedStreamSettings(list));

        assert_eq!(after.stream_settings.len(), 2);
        assert!(!after.stream_settings.contains_key("old"));
        assert_eq!(
            after.stream_settings.get("a"),
            Some(&StreamSettings::new("a").with_secret("k1"))
        );
    }

    #[test]
    fn later_duplicate_slug_wins() {
        let list = vec![
            StreamSettings::new("a").with_notes("first"),
            StreamSettings::new("a").with_notes("second"),
        ];
        let after = reduce(
            Arc::new(DashboardState::default()),
            &Action::UpdatedStreamSettings(list),
        );
        assert_eq!(after.stream_settings["a"].notes.as_deref(), Some("second"));
    }

    #[test]
    fn settings_write_and_errors_are_inert() {
        let before = populated();
        let after = reduce(
            before.clone(),
            &Action::SetStreamSettings(StreamSettings::new("cam1")),
        );
        assert!(Arc::ptr_eq(&before, &after));

        let after = reduce(
            before.clone(),
            &Action::FetchError(ApiError::Network("refused".into())),
        );
        assert!(Arc::ptr_eq(&before, &after));
    }
}
