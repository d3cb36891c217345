//! Peer-side session client.
//!
//! Connects outward to a known `host:port`, registers, then forwards every
//! server-pushed message to the application until told to stop or the link
//! drops. Like the server, all socket I/O runs on one dedicated background
//! thread behind the [`Bridge`].
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐ registration ┌────────────┐
//! │ Disconnected │────────>│ Connecting │─────────────>│ Registered │
//! └──────────────┘         └────────────┘              └────────────┘
//!                                                            │ reply ≠ 200 → Closed
//!                                                            ↓
//!                                                      ┌───────────┐
//!                                                      │ Receiving │──┐ 521 / peer gone /
//!                                                      └───────────┘  │ stop()
//!                                                            ↓        │
//!                                                       ┌────────┐<───┘
//!                                                       │ Closed │
//!                                                       └────────┘
//! ```

use std::{
    net::{TcpStream, ToSocketAddrs},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
    },
    thread::{self, JoinHandle},
};

use breathlink_core::ClientConfig;
use breathlink_proto::{ResponseMessage, code};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    bridge::{Bridge, NetEvent},
    channel::{MessageChannel, ReadOutcome},
    error::NetError,
};

/// Outbound connection to a session host.
pub struct NetClient {
    bridge: Bridge,
    closing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl NetClient {
    /// Connect with a bounded timeout and start the receive loop.
    ///
    /// `registration` is the initial payload sent to the server — it acts
    /// as the client's authentication request. `None` sends an empty
    /// object, letting the server's reply say what was missing.
    pub fn connect(
        config: ClientConfig,
        registration: Option<Value>,
    ) -> Result<(Self, Receiver<NetEvent>), NetError> {
        let addr = config
            .addr
            .to_socket_addrs()
            .map_err(|error| NetError::Config(format!("unusable address `{}`: {error}", config.addr)))?
            .next()
            .ok_or_else(|| NetError::Config(format!("unusable address `{}`", config.addr)))?;

        let stream = TcpStream::connect_timeout(&addr, config.connect_timeout)
            .map_err(|source| NetError::Connect { addr: config.addr.clone(), source })?;
        stream.set_read_timeout(Some(config.read_timeout))?;
        let writer = stream.try_clone()?;

        let (bridge, events) = Bridge::new();
        bridge.attach(MessageChannel::new(writer));
        let closing = Arc::new(AtomicBool::new(false));

        let registration = registration.unwrap_or_else(|| Value::Object(Map::new()));
        let reader = MessageChannel::new(stream);

        let handle = thread::Builder::new().name("breathlink-client".to_string()).spawn({
            let bridge = bridge.clone();
            let closing = Arc::clone(&closing);
            move || run(reader, &bridge, &closing, &registration)
        })?;

        tracing::info!(addr = %config.addr, "client connected");
        Ok((Self { bridge, closing, handle: Some(handle) }, events))
    }

    /// Push any serializable payload to the server (auth retries, commands).
    pub fn send<T: Serialize>(&self, message: &T) -> Result<(), NetError> {
        self.bridge.write(message)
    }

    /// Whether the link is still open.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.bridge.connected()
    }

    /// Stop the client: cooperative flag, close the socket, join the thread.
    ///
    /// Closing the write half shuts the whole socket down, which unblocks a
    /// pending read immediately. Safe to call twice.
    pub fn stop(&mut self) {
        if !self.closing.swap(true, Ordering::Relaxed) {
            self.bridge.detach();
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("client thread panicked");
            }
        }
    }
}

impl Drop for NetClient {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Registration plus receive loop.
fn run(mut reader: MessageChannel, bridge: &Bridge, closing: &AtomicBool, registration: &Value) {
    if let Err(error) = bridge.write(registration) {
        tracing::error!(%error, "registration failed");
        bridge.detach();
        reader.close();
        return;
    }

    let mut registered = false;
    loop {
        if closing.load(Ordering::Relaxed) {
            break;
        }

        match reader.receive() {
            ReadOutcome::NoData => {
                if !reader.connected() {
                    break;
                }
            },
            ReadOutcome::PeerClosed => break,
            ReadOutcome::Malformed => {},
            ReadOutcome::Message(value) => {
                let message = match serde_json::from_value::<ResponseMessage>(value) {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::debug!(%error, "unrecognized server message ignored");
                        continue;
                    },
                };

                // Forward unconditionally, then let the code decide the
                // loop's fate: the first reply is the handshake verdict,
                // 521 afterwards means the host is going down.
                let outcome = message.code;
                bridge.forward(message);

                if !registered {
                    registered = true;
                    if outcome != code::OK {
                        tracing::warn!(code = outcome, "registration rejected");
                        break;
                    }
                } else if outcome == code::SERVER_DOWN {
                    tracing::info!("host is shutting down");
                    break;
                }
            },
        }
    }

    bridge.detach();
    reader.close();
    tracing::info!("client stopped");
}
