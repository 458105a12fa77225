use serde_json::Value;
use thiserror::Error;

use logan_types::LogEntry;

/// Type tag reserved for keep-alive events
pub const HEARTBEAT_TYPE: &str = "heartbeat";

/// A decoded push-stream message
#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    /// Keep-alive with no log content
    Heartbeat,
    Log(LogEntry),
}

/// Why a single stream message could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("not a log entry: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Decoder for push-stream payloads
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode one `data:` payload into a heartbeat or a log entry
    pub fn decode(payload: &str) -> Result<StreamMessage, DecodeError> {
        let value: Value = serde_json::from_str(payload.trim()).map_err(DecodeError::Json)?;

        let Some(obj) = value.as_object() else {
            return Err(DecodeError::NotAnObject(json_kind(&value)));
        };

        if obj.get("type").and_then(Value::as_str) == Some(HEARTBEAT_TYPE) {
            return Ok(StreamMessage::Heartbeat);
        }

        serde_json::from_value(value)
            .map(StreamMessage::Log)
            .map_err(DecodeError::Shape)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
