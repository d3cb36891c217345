//! Host-side session server.
//!
//! Owns the listening socket and one dedicated background thread running a
//! blocking accept/read loop. Protocol decisions are delegated to the pure
//! [`Session`] state machine in `breathlink-core`; this module only executes
//! its actions against real sockets and the application [`Bridge`].
//!
//! # Single-peer policy
//!
//! Exactly one connection is active at a time. A second inbound attempt
//! sits in the OS accept queue until the current session reaches `Closed`;
//! only then does the loop return to `accept`.
//!
//! # Shutdown
//!
//! [`NetServer::stop`] sets a cooperative flag, wakes a pending `accept`
//! with a loopback poke, and joins the thread before returning. An active
//! session observes the flag within the connection read timeout, sends the
//! `521` farewell, and closes.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::Receiver,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use breathlink_core::{
    DisconnectReason, Endpoint, Pairing, ServerConfig, Session, SessionAction, generate_token,
    is_well_formed,
};
use serde_json::{Map, Value};

use crate::{
    bridge::{Bridge, NetEvent},
    channel::{MessageChannel, ReadOutcome},
    error::NetError,
};

/// Listening host endpoint.
///
/// Created with [`NetServer::start`], which binds, generates (or adopts)
/// the pairing token, and spawns the background thread. The returned
/// [`Receiver`] is the application's inbound event stream.
pub struct NetServer {
    bridge: Bridge,
    endpoint: Endpoint,
    local_addr: SocketAddr,
    closing: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl NetServer {
    /// Bind, pick the pairing token, and start accepting in the background.
    ///
    /// Static pairing uses the configured fixed port and pre-shared token
    /// (rejected as [`NetError::Config`] if the token is not 6 uppercase
    /// alphanumerics); otherwise the configured port is bound and a fresh
    /// token is generated for this listening period.
    pub fn start(config: ServerConfig) -> Result<(Self, Receiver<NetEvent>), NetError> {
        let (port, token) = match &config.pairing {
            Pairing::Generated => (config.port, generate_token()),
            Pairing::Static { port, token } => {
                if !is_well_formed(token) {
                    return Err(NetError::Config(format!(
                        "static token `{token}` is not 6 uppercase-alphanumeric characters"
                    )));
                }
                (*port, token.clone())
            },
        };

        let bind_addr = format!("{}:{port}", config.host);
        let listener = TcpListener::bind(&bind_addr)
            .map_err(|source| NetError::Bind { addr: bind_addr, source })?;
        let local_addr = listener.local_addr()?;

        let endpoint = Endpoint {
            host: local_addr.ip().to_string(),
            port: local_addr.port(),
            token: token.clone(),
        };

        let (bridge, events) = Bridge::new();
        let closing = Arc::new(AtomicBool::new(false));
        let session = Session::new(token);

        let handle = thread::Builder::new().name("breathlink-server".to_string()).spawn({
            let bridge = bridge.clone();
            let closing = Arc::clone(&closing);
            let read_timeout = config.read_timeout;
            move || run(&listener, session, &bridge, &closing, read_timeout)
        })?;

        tracing::info!(%endpoint, "server listening");
        Ok((Self { bridge, endpoint, local_addr, closing, handle: Some(handle) }, events))
    }

    /// Pairing endpoint to display: where to connect and which token to
    /// present.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Actual bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Toggle whether inbound commands may be dispatched.
    pub fn set_ready(&self, ready: bool) {
        self.bridge.set_ready(ready);
    }

    /// Whether the application currently accepts commands.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.bridge.is_ready()
    }

    /// Whether a peer session is currently open.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.bridge.connected()
    }

    /// Push a response to the connected peer; a guarded no-op without one.
    pub fn send_response(
        &self,
        code: u16,
        msg: impl Into<String>,
        data: Option<Map<String, Value>>,
    ) -> Result<(), NetError> {
        self.bridge.send(code, msg, data)
    }

    /// Stop the server: cooperative flag, wake the accept, join the thread.
    ///
    /// Synchronous — when this returns the background thread has fully
    /// exited and the listening socket is released. Safe to call twice.
    pub fn stop(&mut self) {
        if !self.closing.swap(true, Ordering::Relaxed) {
            // Wake a pending accept; the loop re-checks the flag before
            // serving whatever this connects.
            let port = self.local_addr.port();
            let poke = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
            let _ = TcpStream::connect_timeout(&poke, Duration::from_millis(200));
            if self.local_addr != poke {
                let _ = TcpStream::connect_timeout(&self.local_addr, Duration::from_millis(200));
            }
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("server thread panicked");
            }
        }
    }
}

impl Drop for NetServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Accept loop: one peer at a time, until told to stop.
fn run(
    listener: &TcpListener,
    mut session: Session,
    bridge: &Bridge,
    closing: &AtomicBool,
    read_timeout: Duration,
) {
    while !closing.load(Ordering::Relaxed) {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(error) => {
                if closing.load(Ordering::Relaxed) {
                    break;
                }
                tracing::error!(%error, "accept failed");
                thread::sleep(Duration::from_millis(100));
                continue;
            },
        };

        if closing.load(Ordering::Relaxed) {
            // The stop() poke, not a peer.
            break;
        }

        if let Err(error) = serve(&mut session, stream, peer, bridge, closing, read_timeout) {
            tracing::error!(%error, %peer, "session setup failed");
        }
    }

    tracing::info!("server stopped");
}

/// Serve one accepted connection to completion.
fn serve(
    session: &mut Session,
    stream: TcpStream,
    peer: SocketAddr,
    bridge: &Bridge,
    closing: &AtomicBool,
    read_timeout: Duration,
) -> Result<(), NetError> {
    stream.set_read_timeout(Some(read_timeout))?;
    let writer = stream.try_clone()?;

    let mut reader = MessageChannel::new(stream);
    bridge.attach(MessageChannel::new(writer));
    session.accepted()?;
    tracing::info!(%peer, "peer connected");

    let reason = drive(session, &mut reader, bridge, closing);

    for action in session.finish(reason) {
        if let SessionAction::Reply(farewell) = action {
            // Best-effort: the peer may already be gone.
            if let Err(error) = bridge.write(&farewell) {
                tracing::debug!(%error, "farewell not delivered");
            }
        }
    }

    bridge.detach();
    reader.close();
    tracing::info!(%peer, ?reason, "peer disconnected");
    Ok(())
}

/// Handshake and command loop for the active connection.
fn drive(
    session: &mut Session,
    reader: &mut MessageChannel,
    bridge: &Bridge,
    closing: &AtomicBool,
) -> DisconnectReason {
    loop {
        if closing.load(Ordering::Relaxed) {
            return DisconnectReason::ForcedShutdown;
        }

        let value = match reader.receive() {
            ReadOutcome::NoData => {
                if !reader.connected() {
                    return DisconnectReason::Transport;
                }
                continue;
            },
            ReadOutcome::PeerClosed => return DisconnectReason::PeerClosed,
            ReadOutcome::Malformed => continue,
            ReadOutcome::Message(value) => value,
        };

        let handled = if session.is_authenticated() {
            session.handle_command(&value, bridge.is_ready())
        } else {
            session.handle_auth(&value)
        };

        let actions = match handled {
            Ok(actions) => actions,
            Err(error) => {
                tracing::error!(%error, "session driven out of order");
                return DisconnectReason::Transport;
            },
        };

        for action in actions {
            match action {
                SessionAction::Reply(reply) => {
                    if let Err(error) = bridge.write(&reply) {
                        tracing::warn!(%error, "reply write failed");
                        return DisconnectReason::Transport;
                    }
                },
                SessionAction::Dispatch(command) => {
                    tracing::debug!(?command, "command dispatched");
                    bridge.dispatch(command);
                },
                SessionAction::Disconnect(reason) => return reason,
            }
        }
    }
}
