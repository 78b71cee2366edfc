//! Stream Monitor - headless runner
//!
//! Connects to the monitor backend, keeps the dashboard state in sync and
//! logs a summary of every change.
//!
//! Usage: `stream-monitor [BASE_URL]` (defaults to `STREAM_MONITOR_URL`).

use std::sync::Arc;

use stream_monitor::stores::{
    select_connection_label, select_fanouts, select_stream_rows, select_stream_settings,
    select_transcoders,
};
use stream_monitor::{logging, Action, ApiClient, Dashboard, MonitorConfig, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(logging::DEFAULT_FILTER);

    let mut config = MonitorConfig::from_env()?;
    if let Some(url) = std::env::args().nth(1) {
        config = config.with_base_url(&url)?;
    }

    let mut store = Store::new();
    store.subscribe(|action, _state| {
        if let Action::FetchError(e) = action {
            tracing::warn!("{}", e.user_message());
        }
    });

    let dashboard = Dashboard::start_with(
        &config,
        store,
        Arc::new(ApiClient::new().with_base_url(config.origin())),
    )?;
    dashboard.dispatcher().fetch_all_settings();

    let mut changes = dashboard.store();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted");
                break;
            }
            state = changes.changed() => {
                let Some(state) = state else { break };
                let rows = select_stream_rows(&state);
                let assigned = rows.iter().filter(|row| row.transcoder.is_some()).count();
                let free_slots: i64 = select_transcoders(&state)
                    .values()
                    .map(|t| t.free_slots())
                    .sum();
                tracing::info!(
                    connection = select_connection_label(&state),
                    streams = rows.len(),
                    assigned,
                    transcoders = select_transcoders(&state).len(),
                    free_slots,
                    fanouts = select_fanouts(&state).len(),
                    settings = select_stream_settings(&state).len(),
                    "state updated"
                );
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}
