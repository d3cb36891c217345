//! Network-to-application boundary.
//!
//! The [`Bridge`] is the only thing the background network thread and the
//! application's own event loop share. It carries three concerns and no
//! business logic:
//!
//! - a **readiness flag** the application toggles to say whether commands
//!   may be dispatched;
//! - an **inbound channel** surfacing every message the network thread
//!   accepts as a [`NetEvent`], consumed at the application's own pace
//!   without ever blocking the network thread;
//! - an **outbound writer**: the write half of the active connection, used
//!   both by the network thread for protocol replies and by the application
//!   for pushing [`ResponseMessage`]s (mode results, interruptions). Writes
//!   are short, synchronous, and guarded by the session-open check inside
//!   the channel.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, Sender},
};

use breathlink_proto::{CommandRequest, ResponseMessage};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{channel::MessageChannel, error::NetError};

/// Event surfaced to the application by the network thread.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    /// A validated peer command, dispatched by a host while ready.
    Command(CommandRequest),

    /// A server-pushed message, forwarded by a peer-side client.
    Response(ResponseMessage),
}

struct Inner {
    ready: AtomicBool,
    events: Sender<NetEvent>,
    writer: Mutex<MessageChannel>,
}

/// Thread-safe handle pair connecting a network thread to the application.
///
/// Cheaply cloneable; the server/client runtime and the owning handle each
/// hold a clone. Dropping all clones closes the inbound channel, which the
/// application observes as the end of its event stream.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl Bridge {
    /// Create a bridge and the application-side event receiver.
    pub fn new() -> (Self, Receiver<NetEvent>) {
        let (events, receiver) = mpsc::channel();
        let inner = Inner {
            ready: AtomicBool::new(false),
            events,
            writer: Mutex::new(MessageChannel::disconnected()),
        };
        (Self { inner: Arc::new(inner) }, receiver)
    }

    /// Toggle whether inbound commands may be dispatched.
    pub fn set_ready(&self, ready: bool) {
        self.inner.ready.store(ready, Ordering::Relaxed);
    }

    /// Whether the application currently accepts commands.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Relaxed)
    }

    /// Whether a session is currently open.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.lock_writer().connected()
    }

    /// Push an outbound response through the active session.
    ///
    /// A guarded no-op when no session is open — the application does not
    /// need to know whether a peer is still there to report a mode result.
    pub fn send(
        &self,
        code: u16,
        msg: impl Into<String>,
        data: Option<Map<String, Value>>,
    ) -> Result<(), NetError> {
        let mut response = ResponseMessage::new(code, msg);
        if let Some(data) = data {
            response = response.with_data(data);
        }
        self.write(&response)
    }

    /// Surface a validated command to the application (host role).
    pub(crate) fn dispatch(&self, command: CommandRequest) {
        if self.inner.events.send(NetEvent::Command(command)).is_err() {
            tracing::debug!("command dropped: application receiver is gone");
        }
    }

    /// Surface a server-pushed message to the application (peer role).
    pub(crate) fn forward(&self, response: ResponseMessage) {
        if self.inner.events.send(NetEvent::Response(response)).is_err() {
            tracing::debug!("message dropped: application receiver is gone");
        }
    }

    /// Write any serializable message through the active session.
    pub(crate) fn write<T: Serialize>(&self, message: &T) -> Result<(), NetError> {
        self.lock_writer().send(message)
    }

    /// Attach the write half of a freshly established connection.
    pub(crate) fn attach(&self, writer: MessageChannel) {
        *self.lock_writer() = writer;
    }

    /// Release the write half; subsequent sends are no-ops.
    pub(crate) fn detach(&self) {
        let mut writer = self.lock_writer();
        writer.close();
        *writer = MessageChannel::disconnected();
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, MessageChannel> {
        // A poisoned writer mutex would mean a panic mid-write on some other
        // thread; the channel is still safe to close or replace.
        self.inner.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use breathlink_proto::code;

    use super::*;

    #[test]
    fn ready_flag_round_trips() {
        let (bridge, _events) = Bridge::new();
        assert!(!bridge.is_ready());
        bridge.set_ready(true);
        assert!(bridge.is_ready());
        bridge.set_ready(false);
        assert!(!bridge.is_ready());
    }

    #[test]
    fn dispatch_reaches_the_application_receiver() {
        let (bridge, events) = Bridge::new();

        bridge.dispatch(CommandRequest::rehab());

        assert_eq!(events.recv().unwrap(), NetEvent::Command(CommandRequest::rehab()));
    }

    #[test]
    fn send_without_session_is_a_guarded_no_op() {
        let (bridge, _events) = Bridge::new();
        assert!(!bridge.connected());
        bridge.send(code::MODE_COMPLETED, "The mode is completed.", None).unwrap();
    }

    #[test]
    fn dropped_receiver_does_not_panic_the_network_thread() {
        let (bridge, events) = Bridge::new();
        drop(events);
        bridge.dispatch(CommandRequest::stop());
        bridge.forward(ResponseMessage::new(code::OK, "ok"));
    }
}
