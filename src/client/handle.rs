//! The cloneable command surface of one connection.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tama_proto::Message;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Registering,
    Registered,
    ShuttingDown,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Registering => "registering",
            Self::Registered => "registered",
            Self::ShuttingDown => "shutting down",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Observable connection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStatus {
    pub state: ConnectionState,
    pub nickname: String,
}

/// The pieces of a handle kept by the connection itself.
pub(crate) struct HandleParts {
    pub outbound: mpsc::UnboundedReceiver<Message>,
    pub status: watch::Sender<ClientStatus>,
}

/// Queue commands onto a connection from anywhere.
///
/// Sends are best-effort: once the connection is gone, messages are
/// dropped with a debug log.
#[derive(Clone)]
pub struct ClientHandle {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    outbound: mpsc::UnboundedSender<Message>,
    status: watch::Receiver<ClientStatus>,
    quitting: AtomicBool,
}

impl ClientHandle {
    pub(crate) fn new(name: &str, nickname: &str) -> (Self, HandleParts) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ClientStatus {
            state: ConnectionState::Connecting,
            nickname: nickname.to_owned(),
        });

        let handle = Self {
            inner: Arc::new(Inner {
                name: name.to_owned(),
                outbound: outbound_tx,
                status: status_rx,
                quitting: AtomicBool::new(false),
            }),
        };
        let parts = HandleParts {
            outbound: outbound_rx,
            status: status_tx,
        };
        (handle, parts)
    }

    /// The configured connection name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current nickname.
    pub fn nickname(&self) -> String {
        self.inner.status.borrow().nickname.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.status.borrow().state
    }

    /// Subscribe to status changes.
    pub fn watch_status(&self) -> watch::Receiver<ClientStatus> {
        self.inner.status.clone()
    }

    /// True once [`ClientHandle::quit`] has been called.
    pub fn is_quitting(&self) -> bool {
        self.inner.quitting.load(Ordering::SeqCst)
    }

    /// True if both handles refer to the same connection.
    pub fn same_connection(&self, other: &ClientHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Queue a raw message.
    pub fn send(&self, msg: Message) {
        if let Err(e) = self.inner.outbound.send(msg) {
            debug!(server = %self.inner.name, command = %e.0.command, "connection gone, dropping message");
        }
    }

    pub fn nick(&self, nickname: &str) {
        self.send(Message::nick(nickname));
    }

    pub fn user(&self, username: &str, realname: &str) {
        self.send(Message::user(username, realname));
    }

    pub fn join(&self, channel: &str) {
        self.send(Message::join(channel));
    }

    pub fn part(&self, channel: &str, reason: Option<&str>) {
        self.send(Message::part(channel, reason));
    }

    pub fn privmsg(&self, target: &str, text: &str) {
        self.send(Message::privmsg(target, text));
    }

    pub fn notice(&self, target: &str, text: &str) {
        self.send(Message::notice(target, text));
    }

    pub fn ping(&self, token: &str) {
        self.send(Message::ping(token));
    }

    pub fn pong(&self, token: &str) {
        self.send(Message::pong(token));
    }

    /// Leave the server deliberately. The connection will not be
    /// reconnected when it closes.
    pub fn quit(&self, reason: Option<&str>) {
        self.inner.quitting.store(true, Ordering::SeqCst);
        self.send(Message::quit(reason.filter(|r| !r.is_empty())));
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("name", &self.inner.name)
            .field("status", &*self.inner.status.borrow())
            .field("quitting", &self.is_quitting())
            .finish()
    }
}
