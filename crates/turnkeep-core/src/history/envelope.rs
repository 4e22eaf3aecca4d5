//! Stored payload decoding.
//!
//! A record's rich payload has had three on-disk shapes over time. Decoding
//! tries them in a fixed order and never fails:
//!
//! 1. **Current** - `{ sdkVersion: <current>, messages: [..] }`
//! 2. **Legacy** - a bare `[..]` of messages
//! 3. **Fallback** - one message rebuilt from the record's flat role/content
//!
//! A single bad element rejects the whole payload. Losing the history is
//! visible to the user; silently dropping an interior turn is not.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{Message, Role, StoredRecord};
use crate::config::HistoryConfig;
use crate::sanitize::reasoning::filter_orphaned_reasoning_all;

/// Why a payload was not trusted.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("no rich payload stored")]
    Absent,

    #[error("envelope has no sdkVersion")]
    MissingVersion,

    #[error("unsupported sdkVersion: {0}")]
    VersionMismatch(String),

    #[error("envelope messages is not an array")]
    MessagesNotArray,

    #[error("message {index} has no recognized role")]
    UnrecognizedRole { index: usize },

    #[error("message {index} is malformed: {source}")]
    MalformedMessage {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload is a JSON {0}, not an envelope or message array")]
    UnrecognizedShape(&'static str),
}

/// Outcome of decoding a raw payload.
#[derive(Debug)]
pub enum DecodedPayload {
    /// A versioned envelope with the trusted tag.
    Current(Vec<Message>),
    /// A pre-versioning bare message array.
    Legacy(Vec<Message>),
    /// Nothing trustworthy; the caller rebuilds from flat text.
    Fallback(PayloadError),
}

/// Classify and decode a raw payload against the trusted version tag.
///
/// Messages are returned exactly as stored; no sanitization happens here.
pub fn decode_payload(payload: Option<&Value>, sdk_version: &str) -> DecodedPayload {
    let result = match payload {
        None | Some(Value::Null) => Err(PayloadError::Absent),
        Some(Value::Object(envelope)) => {
            decode_envelope(envelope, sdk_version).map(DecodedPayload::Current)
        }
        Some(Value::Array(items)) => decode_messages(items).map(DecodedPayload::Legacy),
        Some(other) => Err(PayloadError::UnrecognizedShape(json_kind(other))),
    };

    result.unwrap_or_else(DecodedPayload::Fallback)
}

/// Canonical messages for a record, using the default configuration.
pub fn parse_stored_record(record: &StoredRecord) -> Vec<Message> {
    parse_stored_record_with(record, &HistoryConfig::default())
}

/// Canonical messages for a record.
///
/// Trusted payloads have orphaned reasoning filtered out. Anything else
/// degrades to a single message built from the record's role and content.
pub fn parse_stored_record_with(record: &StoredRecord, config: &HistoryConfig) -> Vec<Message> {
    match decode_payload(record.ai_payload.as_ref(), &config.sdk_version) {
        DecodedPayload::Current(messages) => filter_orphaned_reasoning_all(messages),
        DecodedPayload::Legacy(messages) => {
            log::debug!(
                "Record {} uses a legacy message array ({} messages)",
                record.id,
                messages.len()
            );
            filter_orphaned_reasoning_all(messages)
        }
        DecodedPayload::Fallback(PayloadError::Absent) => vec![record.fallback_message()],
        DecodedPayload::Fallback(reason) => {
            log::warn!(
                "Ignoring rich payload for record {}: {}; using flat content",
                record.id,
                reason
            );
            vec![record.fallback_message()]
        }
    }
}

fn decode_envelope(
    envelope: &Map<String, Value>,
    sdk_version: &str,
) -> Result<Vec<Message>, PayloadError> {
    match envelope.get("sdkVersion") {
        None | Some(Value::Null) => return Err(PayloadError::MissingVersion),
        Some(Value::String(version)) if version == sdk_version => {}
        Some(other) => return Err(PayloadError::VersionMismatch(render_version(other))),
    }

    match envelope.get("messages") {
        Some(Value::Array(items)) => decode_messages(items),
        _ => Err(PayloadError::MessagesNotArray),
    }
}

fn decode_messages(items: &[Value]) -> Result<Vec<Message>, PayloadError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_message(index, item))
        .collect()
}

fn decode_message(index: usize, item: &Value) -> Result<Message, PayloadError> {
    let recognized = item.get("role").and_then(Value::as_str).and_then(Role::parse);
    if recognized.is_none() {
        return Err(PayloadError::UnrecognizedRole { index });
    }

    Message::deserialize(item).map_err(|source| PayloadError::MalformedMessage { index, source })
}

fn render_version(value: &Value) -> String {
    match value {
        Value::String(version) => version.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
