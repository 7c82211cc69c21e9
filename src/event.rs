//! Events emitted by the external client.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::message::MessageBatch;

/// An event delivered by a session.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The connection changed state or produced a pairing code.
    ConnectionUpdate(ConnectionUpdate),
    /// The session credentials changed and should be persisted.
    CredentialsUpdate(Credentials),
    /// New messages arrived.
    MessagesUpsert(MessageBatch),
}

impl Event {
    /// A short name of the event kind, used for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Event::ConnectionUpdate(_) => "connection.update",
            Event::CredentialsUpdate(_) => "creds.update",
            Event::MessagesUpsert(_) => "messages.upsert",
        }
    }
}

/// The connection state reported by the external client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    /// The transport is being established.
    Connecting,
    /// The session is connected and authenticated.
    Open,
    /// The connection was closed.
    Close,
}

/// Why a connection was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// The account logged the session out, or rejected its credentials.
    LoggedOut,
    /// The transport failed.
    ConnectionLost,
    /// The remote end closed the connection.
    ConnectionClosed,
    /// Anything else.
    Other,
}

impl DisconnectReason {
    /// Whether the session can be restarted with the current credentials.
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        !matches!(self, DisconnectReason::LoggedOut)
    }
}

/// Details of the last disconnect.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Disconnect {
    /// The classified reason.
    pub reason: DisconnectReason,
    /// A human readable description of the error.
    pub message: String,
}

impl Disconnect {
    /// Creates a new disconnect description.
    pub fn new(reason: DisconnectReason, message: impl Into<String>) -> Disconnect {
        Disconnect {
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.reason, self.message)
    }
}

/// A connection state change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionUpdate {
    /// The new connection state, if it changed.
    pub connection: Option<Connection>,
    /// Set when `connection` is [`Connection::Close`].
    pub last_disconnect: Option<Disconnect>,
    /// A pairing payload to show to the operator.
    pub qr: Option<String>,
}

impl ConnectionUpdate {
    /// An update that only reports a new state.
    #[must_use]
    pub const fn state(connection: Connection) -> ConnectionUpdate {
        ConnectionUpdate {
            connection: Some(connection),
            last_disconnect: None,
            qr: None,
        }
    }

    /// An update reporting that the connection closed.
    #[must_use]
    pub const fn closed(disconnect: Disconnect) -> ConnectionUpdate {
        ConnectionUpdate {
            connection: Some(Connection::Close),
            last_disconnect: Some(disconnect),
            qr: None,
        }
    }

    /// An update carrying a pairing payload.
    pub fn pairing(qr: impl Into<String>) -> ConnectionUpdate {
        ConnectionUpdate {
            connection: None,
            last_disconnect: None,
            qr: Some(qr.into()),
        }
    }
}
