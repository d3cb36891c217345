//! Breathlink wire protocol.
//!
//! Defines the message shapes exchanged between a host application and a
//! remote peer (companion app or test harness), the response-code table, and
//! schema validation for inbound requests.
//!
//! # Wire format
//!
//! Every logical message is a single UTF-8 JSON object written to the stream
//! as-is: no length prefix, no delimiter. Framing is therefore the
//! responsibility of the transport layer's read discipline (see
//! `breathlink-net`).
//!
//! # Message shapes
//!
//! | Direction | Shape | Fields |
//! |---|---|---|
//! | peer→host | [`AuthRequest`] | `type="auth"`, `token` |
//! | peer→host | [`CommandRequest`] | `type` ∈ {mode, close, stop}, `mode`?, `time`? |
//! | host→peer | [`ResponseMessage`] | `code`, `msg`, `data`? |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod code;
mod message;
mod validate;

pub use message::{AuthKind, AuthRequest, CommandKind, CommandRequest, Mode, ResponseMessage};
pub use validate::{ValidationError, validate_auth, validate_command};
