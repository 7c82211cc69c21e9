//! A [`Connector`] that joins an IRC network through the `irc` crate.
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::stream::StreamExt;
use irc::client::Sender;
use irc::proto::{Command, Message, Response};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span, trace};

use crate::Error;
use crate::auth::Credentials;
use crate::client::{Client, Connector, OutgoingMessage, Session};
use crate::config::{ClientConfig, IrcConfig};
use crate::consts::EVENT_CHANNEL_CAPACITY;
use crate::event::{Connection, ConnectionUpdate, Disconnect, DisconnectReason, Event};
use crate::message::{InboundMessage, MessageBatch, MessageContent, MessageKey};

/// The credentials key holding the nickname the server accepted.
const NICKNAME_KEY: &str = "nickname";

/// Creates IRC sessions.
pub struct IrcConnector {
    config: IrcConfig,
}

impl IrcConnector {
    /// Creates a connector for the network described by `config`.
    #[must_use]
    pub const fn new(config: IrcConfig) -> Self {
        IrcConnector { config }
    }
}

/// A handle for sending messages over an IRC session.
///
/// Messages can only be sent once the connection has been registered.
#[derive(Clone, Default)]
pub struct IrcClient {
    sender: Arc<OnceLock<Sender>>,
}

#[async_trait]
impl Client for IrcClient {
    async fn send_message(&self, recipient: &str, message: OutgoingMessage) -> Result<(), Error> {
        let sender = self.sender.get().ok_or_else(|| Error::Send {
            recipient: recipient.to_string(),
            source: "not connected".into(),
        })?;

        sender
            .send_privmsg(recipient, message.text)
            .map_err(|err| Error::Send {
                recipient: recipient.to_string(),
                source: Box::new(err),
            })
    }
}

#[async_trait]
impl Connector for IrcConnector {
    async fn connect(
        &self,
        config: &ClientConfig,
        credentials: Credentials,
    ) -> Result<Session, Error> {
        let irc_config = build_irc_config(&self.config, config, &credentials);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let client = IrcClient::default();
        let sender = client.sender.clone();

        debug!(
            server = ?irc_config.server,
            port = ?irc_config.port,
            nickname = ?irc_config.nickname,
            "spawning irc session"
        );

        tokio::spawn(
            async move {
                let _ = tx
                    .send(Event::ConnectionUpdate(ConnectionUpdate::state(
                        Connection::Connecting,
                    )))
                    .await;

                let disconnect = match drive(irc_config, credentials, &tx, &sender).await {
                    Ok(disconnect) => disconnect,
                    Err(err) => Disconnect::new(DisconnectReason::ConnectionLost, err.to_string()),
                };

                let _ = tx
                    .send(Event::ConnectionUpdate(ConnectionUpdate::closed(disconnect)))
                    .await;
            }
            .instrument(info_span!("irc_session")),
        );

        Ok(Session {
            client: Arc::new(client),
            events: rx,
        })
    }
}

/// Connects, registers and forwards events until the connection ends or the session is dropped.
async fn drive(
    config: irc::client::data::Config,
    mut credentials: Credentials,
    tx: &mpsc::Sender<Event>,
    sender: &OnceLock<Sender>,
) -> Result<Disconnect, Error> {
    let mut client = irc::client::Client::from_config(config).await?;

    client.identify()?;

    let mut stream = client.stream()?;
    let _ = sender.set(client.sender());

    loop {
        let message = tokio::select! {
            () = tx.closed() => {
                return Ok(Disconnect::new(DisconnectReason::ConnectionClosed, "session dropped"));
            }
            message = stream.next() => message,
        };

        let Some(message) = message.transpose()? else {
            break;
        };

        trace!(?message, "received irc message");

        for translated in translate(&message, client.current_nickname(), &mut credentials) {
            match translated {
                Translated::Event(event) => {
                    if tx.send(event).await.is_err() {
                        return Ok(Disconnect::new(
                            DisconnectReason::ConnectionClosed,
                            "session dropped",
                        ));
                    }
                }
                Translated::Close(disconnect) => return Ok(disconnect),
            }
        }
    }

    Ok(Disconnect::new(
        DisconnectReason::ConnectionClosed,
        "server closed the connection",
    ))
}

/// The result of translating a single IRC message.
#[derive(Debug, PartialEq)]
enum Translated {
    Event(Event),
    Close(Disconnect),
}

/// Translates an IRC protocol message into session events.
fn translate(
    message: &Message,
    current_nickname: &str,
    credentials: &mut Credentials,
) -> Vec<Translated> {
    match message.command {
        Command::Response(Response::RPL_WELCOME, ref args) => {
            let nickname = args.first().map_or(current_nickname, String::as_str);
            let mut events = vec![Translated::Event(Event::ConnectionUpdate(
                ConnectionUpdate::state(Connection::Open),
            ))];

            if credentials.get_str(NICKNAME_KEY) != Some(nickname) {
                credentials.insert(NICKNAME_KEY, nickname);
                events.push(Translated::Event(Event::CredentialsUpdate(
                    credentials.clone(),
                )));
            }

            events
        }
        Command::Response(
            Response::ERR_PASSWDMISMATCH | Response::ERR_YOUREBANNEDCREEP | Response::ERR_SASLFAIL,
            ref args,
        ) => {
            let reason = args.last().cloned().unwrap_or_default();

            vec![Translated::Close(Disconnect::new(
                DisconnectReason::LoggedOut,
                reason,
            ))]
        }
        Command::ERROR(ref reason) => vec![Translated::Close(Disconnect::new(
            DisconnectReason::ConnectionClosed,
            reason.clone(),
        ))],
        Command::PRIVMSG(_, ref text) => {
            let Some(sender) = message.response_target() else {
                return vec![];
            };
            let from_me = message
                .source_nickname()
                .is_some_and(|nick| nick.eq_ignore_ascii_case(current_nickname));
            // CTCP requests are protocol chatter rather than text.
            let content = (!text.starts_with('\u{1}')).then(|| MessageContent {
                conversation: Some(text.clone()),
                extended_text_message: None,
            });
            let inbound = InboundMessage {
                key: MessageKey {
                    remote_jid: sender.to_string(),
                    from_me,
                },
                message: content,
            };

            vec![Translated::Event(Event::MessagesUpsert(
                MessageBatch::notify(vec![inbound]),
            ))]
        }
        _ => vec![],
    }
}

/// Builds the `irc` crate configuration for a session.
///
/// A nickname stored in the credentials takes precedence over the configured one, so the bot
/// keeps the nick it was last registered with.
fn build_irc_config(
    irc: &IrcConfig,
    client: &ClientConfig,
    credentials: &Credentials,
) -> irc::client::data::Config {
    let port = irc.port();
    let use_tls = irc.tls.as_ref().map(|tls| tls.enabled);
    let nickname = credentials
        .get_str(NICKNAME_KEY)
        .map_or_else(|| irc.nickname.clone(), str::to_string);
    let channel_keys = irc
        .channels
        .iter()
        .filter_map(|(name, channel)| {
            let key = channel.as_ref()?.key.clone()?;

            Some((name.clone(), key))
        })
        .collect();

    irc::client::data::Config {
        nickname: Some(nickname),
        alt_nicks: irc.alt_nicks.clone(),
        username: irc.username.clone(),
        realname: Some(
            irc.realname
                .clone()
                .unwrap_or_else(|| client.identity.name().to_string()),
        ),
        server: Some(irc.hostname.clone()),
        password: irc.password.clone(),
        port: Some(port),
        use_tls,
        channels: irc.channels.keys().cloned().collect(),
        channel_keys,
        version: Some(client.identity.to_string()),
        ..Default::default()
    }
}
