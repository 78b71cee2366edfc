//! Read-only projections of the dashboard state for the view layer.

use std::collections::BTreeMap;

use stream_monitor_shared::{Fanout, Stream, StreamSettings, Transcoder};

use super::state::DashboardState;

pub fn select_socket_connected(state: &DashboardState) -> bool {
    state.socket_connected
}

/// "connected" / "disconnected", as shown next to the dashboard title.
pub fn select_connection_label(state: &DashboardState) -> &'static str {
    if state.socket_connected {
        "connected"
    } else {
        "disconnected"
    }
}

pub fn select_streams(state: &DashboardState) -> &BTreeMap<String, Stream> {
    &state.streams
}

pub fn select_transcoders(state: &DashboardState) -> &BTreeMap<String, Transcoder> {
    &state.transcoders
}

pub fn select_stream_transcoders(state: &DashboardState) -> &BTreeMap<String, String> {
    &state.stream_transcoders
}

pub fn select_fanouts(state: &DashboardState) -> &BTreeMap<String, Fanout> {
    &state.fanouts
}

pub fn select_stream_settings(state: &DashboardState) -> &BTreeMap<String, StreamSettings> {
    &state.stream_settings
}

pub fn select_settings_for_stream<'a>(
    state: &'a DashboardState,
    slug: &str,
) -> Option<&'a StreamSettings> {
    state.stream_settings.get(slug)
}

/// The transcoder a stream is assigned to. `None` when unassigned or when the
/// assignment names a transcoder that is not (or no longer) known.
pub fn select_transcoder_for_stream<'a>(
    state: &'a DashboardState,
    slug: &str,
) -> Option<&'a Transcoder> {
    let name = state.stream_transcoders.get(slug)?;
    state.transcoders.get(name)
}

/// A stream together with the transcoder processing it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRow<'a> {
    pub stream: &'a Stream,
    pub transcoder: Option<&'a Transcoder>,
}

/// Streams in slug order, each with its resolved transcoder.
pub fn select_stream_rows(state: &DashboardState) -> Vec<StreamRow<'_>> {
    state
        .streams
        .iter()
        .map(|(slug, stream)| StreamRow {
            stream,
            transcoder: select_transcoder_for_stream(state, slug),
        })
        .collect()
}

/// `(assigned streams, capacity)` of a transcoder.
pub fn select_transcoder_load(state: &DashboardState, name: &str) -> Option<(usize, i64)> {
    state
        .transcoders
        .get(name)
        .map(|t| (t.streams.len(), t.capacity))
}
