//! Entity models pushed by the monitor backend and exchanged over the settings API.
//!
//! Every entity keeps fields it does not know about in `extra`, so a value read
//! from the backend serializes back to the same JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unrecognised JSON fields carried alongside a typed entity.
pub type Extra = BTreeMap<String, serde_json::Value>;

// --- Pipeline entities ---

/// An ingest or relay endpoint, identified by its slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Stream {
    pub slug: String,
    /// ffmpeg format descriptor
    #[serde(skip_serializing_if = "String::is_empty")]
    pub format: String,
    /// complete source URL
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// publish timestamp, unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Stream {
    pub fn new(slug: impl Into<String>, format: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            format: format.into(),
            source: source.into(),
            ..Default::default()
        }
    }
}

/// The streams a transcoder is working on.
///
/// The backend announces only a count; richer sources list the slugs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Assignment {
    Count(u64),
    Slugs(Vec<String>),
}

impl Assignment {
    pub fn len(&self) -> usize {
        match self {
            Assignment::Count(n) => usize::try_from(*n).unwrap_or(usize::MAX),
            Assignment::Slugs(slugs) => slugs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assigned slugs, empty when only a count is known.
    pub fn slugs(&self) -> &[String] {
        match self {
            Assignment::Count(_) => &[],
            Assignment::Slugs(slugs) => slugs,
        }
    }
}

impl Default for Assignment {
    fn default() -> Self {
        Assignment::Slugs(Vec::new())
    }
}

impl From<Vec<String>> for Assignment {
    fn from(slugs: Vec<String>) -> Self {
        Assignment::Slugs(slugs)
    }
}

/// A transcoding worker with a finite capacity and the streams assigned to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Transcoder {
    pub name: String,
    /// Zero or negative means unbounded.
    pub capacity: i64,
    pub streams: Assignment,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Transcoder {
    pub fn new(name: impl Into<String>, capacity: i64, streams: Vec<String>) -> Self {
        Self {
            name: name.into(),
            capacity,
            streams: Assignment::Slugs(streams),
            ..Default::default()
        }
    }

    /// Number of free slots left, saturating at zero for overbooked workers.
    pub fn free_slots(&self) -> i64 {
        let used = i64::try_from(self.streams.len()).unwrap_or(i64::MAX);
        self.capacity.saturating_sub(used).max(0)
    }
}

/// A distribution node forwarding streams to an external sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Fanout {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sink: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Fanout {
    pub fn new(name: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink: sink.into(),
            ..Default::default()
        }
    }
}

// --- Settings ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamOptions {
    pub passthrough: bool,
}

/// Per-stream settings as stored by the backend.
///
/// Only `slug` is mandatory; everything else is optional on the wire and is
/// omitted again on serialization when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub slug: String,
    /// "ingest" or "relay"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_type: Option<String>,
    /// Publishing secret; empty or absent means no auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<StreamOptions>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl StreamSettings {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }

    pub fn with_ingest_type(mut self, ingest_type: impl Into<String>) -> Self {
        self.ingest_type = Some(ingest_type.into());
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Whether publishing to this stream requires a secret.
    pub fn requires_auth(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stream_keeps_unknown_fields() {
        let raw = json!({
            "slug": "cam1",
            "format": "rtmp",
            "source": "rtmp://x",
            "publishedAt": 1700000000,
            "bitrate": 4500
        });
        let stream: Stream = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(stream.published_at, Some(1700000000));
        assert_eq!(stream.extra.get("bitrate"), Some(&json!(4500)));
        assert_eq!(serde_json::to_value(&stream).unwrap(), raw);
    }

    #[test]
    fn partial_settings_serialize_without_defaults() {
        let settings: StreamSettings =
            serde_json::from_value(json!({"slug": "a", "secret": "k1"})).unwrap();
        assert_eq!(settings, StreamSettings::new("a").with_secret("k1"));
        assert_eq!(
            serde_json::to_value(&settings).unwrap(),
            json!({"slug": "a", "secret": "k1"})
        );
    }

    #[test]
    fn settings_without_slug_are_rejected() {
        let result = serde_json::from_value::<StreamSettings>(json!({"secret": "k1"}));
        assert!(result.is_err());
    }

    #[test]
    fn requires_auth_ignores_empty_secret() {
        assert!(!StreamSettings::new("a").requires_auth());
        assert!(!StreamSettings::new("a").with_secret("").requires_auth());
        assert!(StreamSettings::new("a").with_secret("k1").requires_auth());
    }

    #[test]
    fn transcoder_accepts_a_stream_count() {
        let raw = json!({"name": "t1", "capacity": 4, "streams": 2});
        let t: Transcoder = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(t.streams, Assignment::Count(2));
        assert_eq!(t.streams.len(), 2);
        assert!(t.streams.slugs().is_empty());
        assert_eq!(t.free_slots(), 2);
        assert_eq!(serde_json::to_value(&t).unwrap(), raw);
    }

    #[test]
    fn partial_entities_serialize_as_received() {
        let raw = json!({"slug": "cam1"});
        let stream: Stream = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&stream).unwrap(), raw);

        let raw = json!({"name": "f1"});
        let fanout: Fanout = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&fanout).unwrap(), raw);
    }

    #[test]
    fn transcoder_free_slots_saturate() {
        let t = Transcoder::new("t1", 1, vec!["a".into(), "b".into()]);
        assert_eq!(t.free_slots(), 0);
        let t = Transcoder::new("t2", 4, vec!["a".into()]);
        assert_eq!(t.free_slots(), 3);
    }
}
