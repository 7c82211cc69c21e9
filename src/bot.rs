//! The main process for running sessions and reacting to their events.
use tracing::{debug, info, instrument, warn};

use crate::Error;
use crate::auth::{self, AuthState, CredentialSaver};
use crate::client::{Connector, Session};
use crate::config::Config;
use crate::event::{Disconnect, DisconnectReason, Event};
use crate::handler::{self, ConnectionOutcome};
use crate::reconnect::Reconnect;

/// The connection state as seen by the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No session has been started yet.
    Disconnected,
    /// A session has been started and is waiting for the connection to open.
    Connecting,
    /// The connection is open.
    Open,
    /// The account logged the session out. Clearing the stored credentials is required to leave
    /// this state.
    LoggedOut,
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
enum SessionEnd {
    Reconnect(Disconnect),
    LoggedOut(Disconnect),
}

/// The chat bot that manages sessions and answers commands.
pub struct Bot<C> {
    /// The complete configuration
    config: Config,
    /// Creates new sessions
    connector: C,
    /// The current connection state
    state: State,
    /// The restart policy
    reconnect: Reconnect,
    /// The number of sessions started so far
    num_sessions: u64,
}

impl<C: Connector> Bot<C> {
    /// Creates a new bot that will connect using `connector`.
    ///
    /// No session is started until [`Bot::run`] is called.
    #[must_use]
    pub fn new(config: Config, connector: C) -> Self {
        let reconnect = Reconnect::new(config.reconnect.strategy.clone());

        Bot {
            config,
            connector,
            state: State::Disconnected,
            reconnect,
            num_sessions: 0,
        }
    }

    /// Returns the current connection state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Returns the number of sessions started so far.
    #[must_use]
    pub const fn num_sessions(&self) -> u64 {
        self.num_sessions
    }

    /// Runs sessions until the account is logged out.
    ///
    /// Every recoverable disconnect starts exactly one fresh session, after the delay given by
    /// the configured reconnect strategy.
    ///
    /// # Errors
    ///
    /// This function will return an error in the following situations:
    ///
    /// - [`Error::AuthIo`] or [`Error::Credentials`] - if the stored credentials can't be loaded.
    /// - [`Error::Connect`] - if the connector fails to set up a session.
    pub async fn run(&mut self) -> Result<(), Error> {
        loop {
            match self.run_session().await? {
                SessionEnd::Reconnect(disconnect) => {
                    let delay = self.reconnect.next_delay();

                    info!(
                        %disconnect,
                        attempt = self.reconnect.attempt(),
                        ?delay,
                        "restarting session"
                    );

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                SessionEnd::LoggedOut(disconnect) => {
                    self.state = State::LoggedOut;

                    warn!(
                        %disconnect,
                        folder = %self.config.auth.folder.display(),
                        "logged out. to reconnect, delete the auth folder and restart"
                    );

                    return Ok(());
                }
            }
        }
    }

    /// Starts a fresh session and processes its events until the connection closes.
    #[instrument(skip(self), fields(session = self.num_sessions + 1))]
    async fn run_session(&mut self) -> Result<SessionEnd, Error> {
        let AuthState { credentials, saver } = auth::load(&self.config.auth.folder).await?;

        let identity = &self.config.client.identity;

        debug!(
            has_credentials = !credentials.is_empty(),
            name = identity.name(),
            platform = identity.platform(),
            version = identity.version(),
            "starting session"
        );

        self.state = State::Connecting;
        self.num_sessions += 1;

        let session = self
            .connector
            .connect(&self.config.client, credentials)
            .await?;

        Ok(self.process_events(session, &saver).await)
    }

    async fn process_events(&mut self, session: Session, saver: &CredentialSaver) -> SessionEnd {
        let Session { client, mut events } = session;

        while let Some(event) = events.recv().await {
            debug!(event = event.name(), "received event");

            match event {
                Event::ConnectionUpdate(update) => match handler::handle_connection_update(&update)
                {
                    ConnectionOutcome::Continue => {}
                    ConnectionOutcome::Opened => {
                        self.state = State::Open;
                        self.reconnect.reset();
                    }
                    ConnectionOutcome::Reconnect(disconnect) => {
                        self.state = State::Connecting;

                        return SessionEnd::Reconnect(disconnect);
                    }
                    ConnectionOutcome::LoggedOut(disconnect) => {
                        return SessionEnd::LoggedOut(disconnect);
                    }
                },
                Event::CredentialsUpdate(credentials) => {
                    handler::handle_credentials_update(saver, &credentials).await;
                }
                Event::MessagesUpsert(batch) => {
                    let summary = handler::handle_messages_upsert(client.as_ref(), &batch).await;

                    debug!(?summary, "processed batch");
                }
            }
        }

        self.state = State::Connecting;

        SessionEnd::Reconnect(Disconnect::new(
            DisconnectReason::ConnectionClosed,
            "event stream ended",
        ))
    }
}
