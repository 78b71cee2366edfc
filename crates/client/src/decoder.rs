//! Turns raw push frames into state fragments.
//!
//! Malformed frames never get past this point: they are logged and dropped.

use serde_json::Value;
use stream_monitor_shared::{DecodeError, Fragment, KEY_TYPE};

/// Parse a raw frame into a fragment.
///
/// Any JSON object is accepted; its keys are not validated here. The `type`
/// key is stripped.
pub fn decode(raw: &str) -> Result<Fragment, DecodeError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(mut fragment) => {
            fragment.remove(KEY_TYPE);
            Ok(fragment)
        }
        other => Err(DecodeError::NotAnObject(kind_of(&other))),
    }
}

/// Decode a frame, logging and discarding it on failure.
pub fn decode_frame(raw: &str) -> Option<Fragment> {
    match decode(raw) {
        Ok(fragment) => Some(fragment),
        Err(e) => {
            tracing::warn!(error = %e, bytes = raw.len(), "dropping undecodable push frame");
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
