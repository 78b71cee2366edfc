//! HTTP client for the monitor's REST endpoints.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use stream_monitor_shared::ApiError;

/// JSON-over-HTTP client rooted at the monitor's base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
        }
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    /// GET `path` and decode the JSON response.
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(resp).await
    }

    /// POST `body` as JSON to `path` and decode the response.
    ///
    /// An empty response body decodes as JSON `null`, so `Option<T>` response
    /// types see `None`.
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let body_bytes =
            serde_json::to_vec(body).map_err(|e| ApiError::Deserialize(e.to_string()))?;

        let resp = self
            .client
            .post(&url)
            .body(body_bytes)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(resp).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_json<TRes: DeserializeOwned>(resp: Response) -> Result<TRes, ApiError> {
    let status = resp.status().as_u16();
    let is_success = resp.status().is_success();

    let text = resp
        .text()
        .await
        .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

    if !is_success {
        return Err(ApiError::Http { status, body: text });
    }

    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
}
