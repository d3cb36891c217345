//! Breathlink protocol core.
//!
//! Pure protocol logic with no I/O: the per-connection [`Session`] state
//! machine, pairing-token generation, and the configuration surface shared
//! by hosts and peers.
//!
//! # Architecture
//!
//! The state machine follows the action pattern: methods take decoded
//! payloads (plus the application-readiness flag) as input and return
//! [`SessionAction`]s for a runtime to execute. No sockets, no clocks, no
//! threads — which is exactly what makes the handshake and command-loop
//! rules unit-testable without a network. The blocking runtime lives in
//! `breathlink-net`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod session;
mod token;

pub use config::{
    ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_READ_TIMEOUT,
    Endpoint, Pairing, STATIC_AUTH_TOKEN, STATIC_PORT, ServerConfig,
};
pub use session::{DisconnectReason, Session, SessionAction, SessionError, SessionState};
pub use token::{TOKEN_LEN, generate_token, is_well_formed};
