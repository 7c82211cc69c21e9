//! The contract the bot expects from an external chat client library.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Error;
use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::event::Event;

/// The content of an outgoing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// The text body.
    pub text: String,
}

impl OutgoingMessage {
    /// Creates a text message.
    pub fn text(text: impl Into<String>) -> OutgoingMessage {
        OutgoingMessage { text: text.into() }
    }
}

/// A connected chat client.
#[async_trait]
pub trait Client: Send + Sync {
    /// Sends `message` to `recipient`, returning once the transport has accepted it.
    async fn send_message(&self, recipient: &str, message: OutgoingMessage) -> Result<(), Error>;
}

/// A live session: a client to send with and the events it produces.
pub struct Session {
    /// The client handle.
    pub client: Arc<dyn Client>,
    /// Events, in the order the client produced them. The stream ends when the client goes away.
    pub events: mpsc::Receiver<Event>,
}

/// Creates sessions.
///
/// Connecting returns as soon as the session is set up; progress of the underlying transport is
/// reported through [`Event::ConnectionUpdate`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Starts a new session authenticated with `credentials`.
    async fn connect(
        &self,
        config: &ClientConfig,
        credentials: Credentials,
    ) -> Result<Session, Error>;
}

#[async_trait]
impl<C: Connector + ?Sized> Connector for Arc<C> {
    async fn connect(
        &self,
        config: &ClientConfig,
        credentials: Credentials,
    ) -> Result<Session, Error> {
        (**self).connect(config, credentials).await
    }
}
