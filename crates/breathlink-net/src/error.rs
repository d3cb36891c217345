//! Runtime error types.

use std::io;

use breathlink_core::SessionError;
use thiserror::Error;

/// Errors that can occur in the blocking runtime.
///
/// Per-session transport failures are deliberately *not* represented here as
/// fatal values: they close the affected session, get logged, and the server
/// returns to accepting. Only failures the caller can act on (bad
/// configuration, bind/connect problems, a dead outbound channel) surface as
/// errors.
#[derive(Debug, Error)]
pub enum NetError {
    /// Configuration error (unusable address, malformed static token).
    ///
    /// Fatal for startup; fix the configuration and start again.
    #[error("configuration error: {0}")]
    Config(String),

    /// Could not bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was being bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Could not establish the outbound connection.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was being connected to.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Socket-level failure on an established connection.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// Outbound message could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// State machine was driven out of order (runtime bug).
    #[error(transparent)]
    Session(#[from] SessionError),
}
