//! Message types for the session protocol.
//!
//! These structs are the typed counterparts of the JSON objects on the wire.
//! Inbound payloads are not deserialized into them directly — peers send
//! loosely-shaped JSON, so acceptance goes through [`crate::validate_auth`]
//! and [`crate::validate_command`], which produce these types only for
//! payloads that pass the schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Peer-to-host authentication request, consumed once during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// Always the literal `"auth"`.
    #[serde(rename = "type")]
    pub kind: AuthKind,

    /// Pairing token presented by the peer.
    pub token: String,
}

impl AuthRequest {
    /// Build an authentication request for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self { kind: AuthKind::Auth, token: token.into() }
    }
}

/// The single recognized authentication request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// Token-based handshake request.
    Auth,
}

/// Peer-to-host command request.
///
/// # Invariants
///
/// - `kind == Mode` requires `mode` to be present.
/// - `mode == Test` requires `time` to be present and ≥ 1.
/// - `Close`/`Stop` never carry `mode`/`time` requirements.
///
/// [`crate::validate_command`] is the only path that should produce one of
/// these from peer input; the invariants hold for every value it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Command discriminator.
    #[serde(rename = "type")]
    pub kind: CommandKind,

    /// Requested mode, present only for `mode` commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Run duration in minutes, required for test mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

impl CommandRequest {
    /// Start a timed test run of `minutes` minutes.
    pub fn test(minutes: u64) -> Self {
        Self { kind: CommandKind::Mode, mode: Some(Mode::Test), time: Some(minutes) }
    }

    /// Start an open-ended rehabilitation run.
    pub fn rehab() -> Self {
        Self { kind: CommandKind::Mode, mode: Some(Mode::Rehab), time: None }
    }

    /// Stop whatever mode is currently running.
    pub fn stop() -> Self {
        Self { kind: CommandKind::Stop, mode: None, time: None }
    }

    /// End the session gracefully.
    pub fn close() -> Self {
        Self { kind: CommandKind::Close, mode: None, time: None }
    }

    /// Short label for acknowledgements: the mode name when present,
    /// otherwise the command type.
    pub fn label(&self) -> &'static str {
        match (self.mode, self.kind) {
            (Some(Mode::Test), _) => "test",
            (Some(Mode::Rehab), _) => "rehab",
            (None, CommandKind::Mode) => "mode",
            (None, CommandKind::Close) => "close",
            (None, CommandKind::Stop) => "stop",
        }
    }
}

/// Recognized command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Start a mode run (`mode` field selects which).
    Mode,
    /// End the session gracefully.
    Close,
    /// Interrupt the currently running mode.
    Stop,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode => write!(f, "mode"),
            Self::Close => write!(f, "close"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// Recognized application modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Timed breathing test; requires a duration.
    Test,
    /// Open-ended rehabilitation session.
    Rehab,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Rehab => write!(f, "rehab"),
        }
    }
}

/// Host-to-peer outcome report.
///
/// Every reply the host writes is one of these; `data` carries optional
/// application-defined results (e.g. analytics of a completed mode run) and
/// is omitted from the wire when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Outcome code, see [`crate::code`].
    pub code: u16,

    /// Human-readable outcome description.
    pub msg: String,

    /// Optional application-defined payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl ResponseMessage {
    /// Build a response with no data payload.
    pub fn new(code: u16, msg: impl Into<String>) -> Self {
        Self { code, msg: msg.into(), data: None }
    }

    /// Attach a data payload.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }
}
