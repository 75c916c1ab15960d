//! Wire codec for the JSON documents exchanged over a connection.
//!
//! Every inbound frame must be a JSON object with a string `action` field; the
//! remaining fields are opaque to the core and handed to the action handler.

use serde_json::{Map, Value};

use crate::error::{codec_error, CodecErrorKind, Result};

/// A string-keyed JSON document.
pub type Payload = Map<String, Value>;

/// Name of the mandatory routing field.
pub const ACTION_FIELD: &str = "action";

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub action: String,
    pub payload: Payload,
}

/// Parses a raw text frame into its action name and full payload.
pub fn decode(raw: &str) -> Result<Inbound> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(payload) = value else {
        return Err(codec_error(
            CodecErrorKind::Malformed,
            "frame is not a JSON object",
        ));
    };

    let action = payload
        .get(ACTION_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            codec_error(
                CodecErrorKind::MissingAction,
                "frame has no string \"action\" field",
            )
        })?;

    Ok(Inbound { action, payload })
}

pub fn encode(payload: &Payload) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

/// Builds a payload whose `action` field is already set.
pub fn with_action(action: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert(ACTION_FIELD.to_string(), Value::String(action.to_string()));
    payload
}
