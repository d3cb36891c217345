//! Framing and transport primitive.
//!
//! A [`MessageChannel`] wraps one connected TCP stream and maps between
//! structured messages and wire bytes: `send` serializes a message to
//! compact JSON and writes it out, `receive` performs one bounded read and
//! decodes whatever arrived.
//!
//! # Framing discipline
//!
//! One `receive` call maps to **one** protocol message: a single read of at
//! most [`MAX_MESSAGE_BYTES`] bytes, no buffering across calls, no length
//! prefix or delimiter on the wire. Peers in the field depend on this exact
//! boundary behavior, so it is preserved as-is. Known consequence: a
//! message longer than 1024 bytes, or one split across TCP segments, is
//! partially read and fails decode (a [`ReadOutcome::Malformed`] no-op for
//! the caller). Likewise, two messages written back-to-back can coalesce
//! into one read; the protocol avoids this by only ever having one reply in
//! flight per request.

use std::{
    io::{Read, Write},
    net::{Shutdown, TcpStream},
};

use serde::Serialize;
use serde_json::Value;

use crate::error::NetError;

/// Upper bound of a single read, and therefore of a decodable message.
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// Result of one bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Nothing to decode: no connection, a read timeout, or a transport
    /// failure that just closed the channel. The caller polls again.
    NoData,

    /// The peer shut the connection down cleanly (zero-byte read on an open
    /// socket). Distinct from `NoData`: the session is over.
    PeerClosed,

    /// Bytes arrived but are not a valid JSON message. The caller treats
    /// this as a no-op, not a fatal error.
    Malformed,

    /// A well-formed message.
    Message(Value),
}

/// One connected stream plus the encode/decode rules of the protocol.
///
/// Exclusively owned by the component that created it; the write half of a
/// connection is a separate `MessageChannel` over a cloned stream handle
/// (see `Bridge`), so reads and writes never contend.
#[derive(Debug)]
pub struct MessageChannel {
    stream: Option<TcpStream>,
}

impl MessageChannel {
    /// Channel over an established connection.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream: Some(stream) }
    }

    /// Channel with no connection; every operation is a no-op until one is
    /// attached.
    pub fn disconnected() -> Self {
        Self { stream: None }
    }

    /// Whether a connection is currently attached.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Serialize `message` to compact JSON and write all bytes.
    ///
    /// A no-op when not connected. A write failure closes the channel —
    /// transport failures end the session and are never retried.
    pub fn send<T: Serialize>(&mut self, message: &T) -> Result<(), NetError> {
        let Some(stream) = self.stream.as_mut() else {
            tracing::trace!("send skipped: not connected");
            return Ok(());
        };

        let bytes = serde_json::to_vec(message)?;
        tracing::debug!(len = bytes.len(), "message sent");

        if let Err(error) = stream.write_all(&bytes) {
            self.close();
            return Err(NetError::Transport(error));
        }
        Ok(())
    }

    /// Attempt one bounded read and decode the result.
    ///
    /// A read timeout is not an error: the caller gets
    /// [`ReadOutcome::NoData`] and retries. A connection reset or abort
    /// closes the channel before reporting `NoData`.
    pub fn receive(&mut self) -> ReadOutcome {
        let Some(stream) = self.stream.as_mut() else {
            return ReadOutcome::NoData;
        };

        let mut buffer = [0u8; MAX_MESSAGE_BYTES];
        match stream.read(&mut buffer) {
            Ok(0) => ReadOutcome::PeerClosed,
            Ok(len) => {
                tracing::debug!(len, "data received");
                match serde_json::from_slice::<Value>(&buffer[..len]) {
                    Ok(value) => ReadOutcome::Message(value),
                    Err(error) => {
                        tracing::debug!(%error, "undecodable data ignored");
                        ReadOutcome::Malformed
                    },
                }
            },
            Err(error) => match error.kind() {
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                    ReadOutcome::NoData
                },
                kind => {
                    tracing::debug!(%kind, "read failed, closing channel");
                    self.close();
                    ReadOutcome::NoData
                },
            },
        }
    }

    /// Shut the connection down and release the handle. Idempotent.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
