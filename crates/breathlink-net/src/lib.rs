//! Breathlink blocking runtime.
//!
//! Production glue that wraps the pure protocol logic in `breathlink-core`
//! with real sockets and threads: plain TCP/IPv4, one UTF-8 JSON object per
//! logical message, one dedicated background thread per component.
//!
//! # Components
//!
//! - [`MessageChannel`]: framing and transport primitive (single bounded
//!   read per message)
//! - [`NetServer`]: listening host — accept loop, token handshake, command
//!   loop, one peer at a time
//! - [`NetClient`]: outbound peer — registration plus receive loop
//! - [`Bridge`]: thread-safe boundary between the network thread and the
//!   application's own event loop (readiness flag, inbound [`NetEvent`]
//!   channel, outbound response writer)
//!
//! The hosting application stays single-threaded: it polls the event
//! receiver at its own pace and pushes responses back through the handle it
//! owns. Cross-thread traffic is one-directional on each path, so no
//! session state is ever written concurrently from both sides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod channel;
mod client;
mod error;
mod server;

pub use bridge::{Bridge, NetEvent};
pub use channel::{MAX_MESSAGE_BYTES, MessageChannel, ReadOutcome};
pub use client::NetClient;
pub use error::NetError;
pub use server::NetServer;
