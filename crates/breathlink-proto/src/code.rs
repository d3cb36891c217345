//! Response-code table shared by host and peer.
//!
//! Codes follow the HTTP numbering the original companion apps already
//! understand; they are plain integers on the wire, not an enum, because
//! peers are free to introduce application-defined codes.

/// Generic success: authorization accepted, command dispatched, or graceful
/// disconnect.
pub const OK: u16 = 200;

/// Application-defined: a mode run finished successfully.
pub const MODE_COMPLETED: u16 = 201;

/// Application-defined: a mode run was interrupted or failed.
pub const MODE_INTERRUPTED: u16 = 204;

/// Payload was malformed or failed schema validation.
pub const BAD_REQUEST: u16 = 400;

/// Presented authentication token did not match the session token.
pub const TOKEN_NOT_FOUND: u16 = 404;

/// Application is not ready to accept commands; the command was discarded.
pub const NOT_READY: u16 = 425;

/// Host forced a shutdown while the peer was connected.
pub const SERVER_DOWN: u16 = 521;
