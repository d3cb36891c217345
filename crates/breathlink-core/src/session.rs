//! Session layer state machine.
//!
//! Manages the lifecycle of one peer connection: token handshake, command
//! acceptance, and disconnect bookkeeping. Uses the action pattern: methods
//! take decoded payloads as input and return actions for the runtime to
//! execute. This keeps the state machine pure (no I/O) and makes testing
//! straightforward.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────┐  accept   ┌──────────────┐  valid token  ┌───────────────┐
//! │ Listening │──────────>│ AwaitingAuth │──────────────>│ Authenticated │
//! └───────────┘           └──────────────┘               └───────────────┘
//!                              │    ↑                           │
//!                   bad token  │    │ retry allowed             │ close / peer gone /
//!                   or shape   └────┘                           │ forced shutdown
//!                                                               ↓
//!                                                          ┌────────┐
//!                                                          │ Closed │
//!                                                          └────────┘
//! ```
//!
//! A rejected handshake (schema failure or token mismatch) deliberately
//! leaves the session in `AwaitingAuth`: the peer keeps the socket and may
//! retry. Only the peer's `close` command, a vanished peer, a transport
//! failure, or a host shutdown reach `Closed`.

use breathlink_proto::{CommandKind, CommandRequest, ResponseMessage, code, validate_auth, validate_command};
use serde_json::Value;
use thiserror::Error;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Listener is up, no peer accepted yet.
    Listening,
    /// Peer accepted, handshake not completed.
    AwaitingAuth,
    /// Handshake completed, command loop running.
    Authenticated,
    /// Session over; the socket is released by the runtime.
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer sent a `close` command.
    PeerRequested,
    /// Peer vanished (zero-byte read on an open socket).
    PeerClosed,
    /// Host is shutting down while the peer is connected.
    ForcedShutdown,
    /// Transport failure (reset, abort, I/O error).
    Transport,
}

/// Actions returned by the session state machine.
///
/// The runtime executes these in order:
/// - `Reply`: serialize the response and write it to the peer
/// - `Dispatch`: forward the accepted command across the application bridge
/// - `Disconnect`: leave the command loop and finish the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Send this response to the peer.
    Reply(ResponseMessage),

    /// Hand this accepted command to the application.
    Dispatch(CommandRequest),

    /// Leave the command loop for this reason.
    Disconnect(DisconnectReason),
}

/// Errors that can occur driving the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A method was called in a state it is not valid for. Indicates a bug
    /// in the driving runtime, not peer misbehavior.
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State the session was in.
        state: SessionState,
        /// Operation that was attempted.
        operation: &'static str,
    },
}

/// Per-connection session state machine.
///
/// One of these exists per accepted (server) or established (client)
/// connection. The socket itself is owned by the runtime; the machine only
/// tracks protocol state and the pairing token, which is never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct Session {
    /// Current state.
    state: SessionState,
    /// Token a peer must present to authenticate.
    token: String,
}

impl Session {
    /// Create a session for a listening period with the given pairing token.
    pub fn new(token: impl Into<String>) -> Self {
        Self { state: SessionState::Listening, token: token.into() }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Pairing token for this listening period.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// True once the handshake has completed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Mark a peer connection as accepted; the handshake may begin.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] unless in `Listening` or `Closed`
    ///   (a finished session is reused for the next accepted peer).
    pub fn accepted(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Listening | SessionState::Closed => {
                self.state = SessionState::AwaitingAuth;
                Ok(())
            },
            state => Err(SessionError::InvalidState { state, operation: "accept" }),
        }
    }

    /// Process one handshake payload.
    ///
    /// Schema failures reply `400`, token mismatches reply `404`; both leave
    /// the session in `AwaitingAuth` so the peer may retry. A matching token
    /// replies `200` and advances to `Authenticated`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] if not in `AwaitingAuth`
    pub fn handle_auth(&mut self, payload: &Value) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::AwaitingAuth {
            return Err(SessionError::InvalidState { state: self.state, operation: "handle_auth" });
        }

        let request = match validate_auth(payload) {
            Ok(request) => request,
            Err(rejection) => {
                return Ok(vec![SessionAction::Reply(ResponseMessage::new(
                    code::BAD_REQUEST,
                    rejection.to_string(),
                ))]);
            },
        };

        if request.token != self.token {
            return Ok(vec![SessionAction::Reply(ResponseMessage::new(
                code::TOKEN_NOT_FOUND,
                "Your auth-token not found.",
            ))]);
        }

        self.state = SessionState::Authenticated;
        Ok(vec![SessionAction::Reply(ResponseMessage::new(
            code::OK,
            "Authorization is successful.",
        ))])
    }

    /// Process one command payload from an authenticated peer.
    ///
    /// - schema failure → reply `400`, stay in the loop;
    /// - `close` → disconnect gracefully;
    /// - application not ready → reply `425`, discard the command;
    /// - otherwise → dispatch to the application and acknowledge `200`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidState`] if not in `Authenticated`
    pub fn handle_command(
        &mut self,
        payload: &Value,
        app_ready: bool,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Authenticated {
            return Err(SessionError::InvalidState {
                state: self.state,
                operation: "handle_command",
            });
        }

        let command = match validate_command(payload) {
            Ok(command) => command,
            Err(rejection) => {
                return Ok(vec![SessionAction::Reply(ResponseMessage::new(
                    code::BAD_REQUEST,
                    rejection.to_string(),
                ))]);
            },
        };

        if command.kind == CommandKind::Close {
            return Ok(vec![SessionAction::Disconnect(DisconnectReason::PeerRequested)]);
        }

        if !app_ready {
            return Ok(vec![SessionAction::Reply(ResponseMessage::new(
                code::NOT_READY,
                "The application is not ready yet.",
            ))]);
        }

        let ack = ResponseMessage::new(
            code::OK,
            format!("Starting {} command...", command.label()),
        );
        Ok(vec![SessionAction::Dispatch(command), SessionAction::Reply(ack)])
    }

    /// Finish the session and produce the farewell reply.
    ///
    /// A forced shutdown says `521`; every other exit (peer `close`, peer
    /// vanished) says `200`. Transport failures also land here — the reply
    /// write is then a no-op on the already-dead channel, which is fine:
    /// the farewell is best-effort by design.
    pub fn finish(&mut self, reason: DisconnectReason) -> Vec<SessionAction> {
        self.state = SessionState::Closed;

        let farewell = match reason {
            DisconnectReason::ForcedShutdown => {
                ResponseMessage::new(code::SERVER_DOWN, "Server is Down")
            },
            _ => ResponseMessage::new(code::OK, "Disconnected successfully."),
        };

        vec![SessionAction::Reply(farewell)]
    }
}
