//! Error taxonomy of the synchronization core.
//!
//! None of these are fatal: connection errors are retried, decode errors drop
//! the offending frame and API errors travel as action payloads.

use thiserror::Error;

/// Transport-level failure of the push connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not connected")]
    NotConnected,
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("gave up after {attempts} reconnect attempts")]
    RetriesExhausted { attempts: u32 },
}

/// An inbound frame that could not be turned into a fragment.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a json object, got {0}")]
    NotAnObject(&'static str),
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// A failed settings request, as carried by the dispatcher's error action.
pub type FetchError = ApiError;

impl ApiError {
    /// Short text for a notification layer. Prefers the response body the
    /// backend wrote with its error status.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { body, .. } if !body.trim().is_empty() => body.trim().to_string(),
            ApiError::Http { status, .. } => format!("request failed with status {status}"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_body() {
        let err = ApiError::Http {
            status: 422,
            body: "parse failed: empty payload\n".into(),
        };
        assert_eq!(err.user_message(), "parse failed: empty payload");

        let err = ApiError::Http {
            status: 500,
            body: "  ".into(),
        };
        assert_eq!(err.user_message(), "request failed with status 500");
    }

    #[test]
    fn decode_error_wraps_serde() {
        let err: DecodeError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("malformed json"));
    }
}
