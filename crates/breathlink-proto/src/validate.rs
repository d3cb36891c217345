//! Schema acceptance for inbound peer payloads.
//!
//! Two entry points mirror the two message shapes a peer may send:
//! [`validate_auth`] during the handshake and [`validate_command`] inside
//! the command loop. Both take the decoded JSON value as-is and either
//! produce the typed request or a [`ValidationError`] naming the offending
//! field — the rendering of that error is what the host sends back in the
//! `400` reply, so peers see exactly which field was rejected and why.
//!
//! Unknown extra fields are ignored, matching what companion apps already
//! rely on.

use serde_json::Value;
use thiserror::Error;

use crate::message::{AuthRequest, CommandKind, CommandRequest, Mode};

/// Rejection detail: the offending field plus a human-readable reason.
///
/// Renders as `` invalid `field`: reason ``, suitable for direct
/// transmission to the peer as the `msg` of a `400` response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    /// Field that failed validation (`payload` when the whole value is
    /// unusable).
    pub field: &'static str,
    /// Why the field was rejected.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }
}

/// Accept only `{type: "auth", token: <string>}`.
///
/// Any other shape, or a `type` outside the recognized authentication type,
/// is rejected. Token *matching* is not done here — that is session state
/// the validator has no business knowing.
pub fn validate_auth(payload: &Value) -> Result<AuthRequest, ValidationError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ValidationError::new("payload", "expected a JSON object"))?;

    match object.get("type").and_then(Value::as_str) {
        Some("auth") => {},
        Some(other) => {
            return Err(ValidationError::new(
                "type",
                format!("`{other}` is not an authentication request"),
            ));
        },
        None => return Err(ValidationError::new("type", "missing or not a string")),
    }

    let token = object
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::new("token", "missing or not a string"))?;

    Ok(AuthRequest::new(token))
}

/// Accept `{type, mode?, time?}` per the command-request invariants.
///
/// - `type` must be one of `mode`, `close`, `stop`;
/// - `mode` commands require `mode` ∈ {`test`, `rehab`};
/// - test mode requires `time`, a positive integer of minutes;
/// - `time`, when present at all, must be a positive integer.
pub fn validate_command(payload: &Value) -> Result<CommandRequest, ValidationError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ValidationError::new("payload", "expected a JSON object"))?;

    let kind = match object.get("type").and_then(Value::as_str) {
        Some("mode") => CommandKind::Mode,
        Some("close") => CommandKind::Close,
        Some("stop") => CommandKind::Stop,
        Some(other) => {
            return Err(ValidationError::new("type", format!("`{other}` is not an available type")));
        },
        None => return Err(ValidationError::new("type", "missing or not a string")),
    };

    // close/stop carry no further requirements; extra fields are ignored.
    if kind != CommandKind::Mode {
        return Ok(CommandRequest { kind, mode: None, time: None });
    }

    let mode = match object.get("mode").and_then(Value::as_str) {
        Some("test") => Mode::Test,
        Some("rehab") => Mode::Rehab,
        Some(other) => {
            return Err(ValidationError::new("mode", format!("`{other}` is not an available mode")));
        },
        None => return Err(ValidationError::new("mode", "required for `mode` commands")),
    };

    let time = match object.get("time") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_u64() {
            Some(minutes) if minutes >= 1 => Some(minutes),
            _ => {
                return Err(ValidationError::new("time", "must be a positive integer of minutes"));
            },
        },
    };

    if mode == Mode::Test && time.is_none() {
        return Err(ValidationError::new("time", "required when mode is `test`"));
    }

    Ok(CommandRequest { kind, mode: Some(mode), time })
}
