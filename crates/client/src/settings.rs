//! Stream settings over REST.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use stream_monitor_shared::{stream_settings_path, ApiError, StreamSettings, SETTINGS_PATH};

use crate::api_client::ApiClient;

/// Number of random bytes behind a generated stream secret.
pub const SECRET_BYTES: usize = 12;

/// Read/write access to per-stream settings.
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// Every stream's settings, in server order.
    async fn fetch_all_settings(&self) -> Result<Vec<StreamSettings>, ApiError>;

    async fn fetch_settings(&self, slug: &str) -> Result<StreamSettings, ApiError>;

    /// Store `settings` under its slug and return what the server kept.
    async fn submit_settings(&self, settings: &StreamSettings) -> Result<StreamSettings, ApiError>;
}

#[async_trait]
impl SettingsApi for ApiClient {
    async fn fetch_all_settings(&self) -> Result<Vec<StreamSettings>, ApiError> {
        // The backend encodes an empty list as `null`.
        let list: Option<Vec<StreamSettings>> = self.get_json(SETTINGS_PATH).await?;
        Ok(list.unwrap_or_default())
    }

    async fn fetch_settings(&self, slug: &str) -> Result<StreamSettings, ApiError> {
        self.get_json(&stream_settings_path(slug)).await
    }

    async fn submit_settings(&self, settings: &StreamSettings) -> Result<StreamSettings, ApiError> {
        let canonical: Option<StreamSettings> = self
            .post_json(&stream_settings_path(&settings.slug), settings)
            .await?;
        // An empty 200 means the body was stored as sent.
        Ok(canonical.unwrap_or_else(|| settings.clone()))
    }
}

/// A fresh ingest secret: random bytes, URL-safe base64.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}
