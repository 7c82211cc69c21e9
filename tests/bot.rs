use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use bwmxmd::auth::Credentials;
use bwmxmd::config::{AuthConfig, ClientConfig};
use bwmxmd::event::{Connection, ConnectionUpdate, Disconnect, DisconnectReason, Event};
use bwmxmd::message::{InboundMessage, MessageBatch};
use bwmxmd::{Bot, Client, Config, Connector, Error, OutgoingMessage, Session, State};

/// Records replies, failing for the recipients it's told to.
#[derive(Default)]
struct RecordingClient {
    sent: Mutex<Vec<(String, String)>>,
    failing: Vec<String>,
}

#[async_trait]
impl Client for RecordingClient {
    async fn send_message(&self, recipient: &str, message: OutgoingMessage) -> Result<(), Error> {
        if self.failing.iter().any(|r| r == recipient) {
            return Err(Error::Send {
                recipient: recipient.to_string(),
                source: "timed out".into(),
            });
        }

        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.text));

        Ok(())
    }
}

/// Hands out one scripted session per connect.
struct ScriptedConnector {
    scripts: Mutex<VecDeque<Vec<Event>>>,
    client: Arc<RecordingClient>,
    connects: Mutex<Vec<Credentials>>,
}

impl ScriptedConnector {
    fn new(scripts: Vec<Vec<Event>>) -> Arc<ScriptedConnector> {
        Self::with_client(scripts, RecordingClient::default())
    }

    fn with_client(scripts: Vec<Vec<Event>>, client: RecordingClient) -> Arc<ScriptedConnector> {
        Arc::new(ScriptedConnector {
            scripts: Mutex::new(scripts.into()),
            client: Arc::new(client),
            connects: Mutex::new(vec![]),
        })
    }

    fn num_connects(&self) -> usize {
        self.connects.lock().unwrap().len()
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.client.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        _config: &ClientConfig,
        credentials: Credentials,
    ) -> Result<Session, Error> {
        self.connects.lock().unwrap().push(credentials);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Connect("no sessions left".into()))?;
        let (tx, rx) = mpsc::channel(script.len().max(1));

        for event in script {
            tx.try_send(event).expect("channel has room for the script");
        }

        Ok(Session {
            client: self.client.clone(),
            events: rx,
        })
    }
}

fn open() -> Event {
    Event::ConnectionUpdate(ConnectionUpdate::state(Connection::Open))
}

fn close(reason: DisconnectReason) -> Event {
    Event::ConnectionUpdate(ConnectionUpdate::closed(Disconnect::new(
        reason,
        format!("{reason:?}"),
    )))
}

fn config(dir: &tempfile::TempDir) -> Config {
    Config {
        auth: AuthConfig {
            folder: dir.path().join("auth"),
        },
        ..Config::default()
    }
}

#[tokio::test]
async fn replies_only_to_others() {
    let dir = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new(vec![vec![
        open(),
        Event::MessagesUpsert(MessageBatch::notify(vec![
            InboundMessage::from_text("me@s.whatsapp.net", "!ping").sent_by_me(),
            InboundMessage::from_text("friend@s.whatsapp.net", "!ping"),
        ])),
        close(DisconnectReason::LoggedOut),
    ]]);
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    bot.run().await.unwrap();

    assert_eq!(
        connector.sent(),
        vec![("friend@s.whatsapp.net".to_string(), "🏓 Pong!".to_string())]
    );
    assert_eq!(bot.state(), State::LoggedOut);
}

#[tokio::test]
async fn logout_is_not_restarted() {
    let dir = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new(vec![
        vec![open(), close(DisconnectReason::LoggedOut)],
        vec![open()],
    ]);
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    bot.run().await.unwrap();

    assert_eq!(connector.num_connects(), 1);
    assert_eq!(bot.num_sessions(), 1);
}

#[tokio::test]
async fn each_disconnect_restarts_once() {
    let dir = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new(vec![
        vec![
            open(),
            close(DisconnectReason::ConnectionLost),
            // Stale events from the dead session must not cause a second restart.
            close(DisconnectReason::ConnectionLost),
        ],
        vec![open(), close(DisconnectReason::ConnectionClosed)],
        vec![open(), close(DisconnectReason::LoggedOut)],
    ]);
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    bot.run().await.unwrap();

    assert_eq!(connector.num_connects(), 3);
}

#[tokio::test]
async fn ended_event_stream_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new(vec![
        vec![open()],
        vec![close(DisconnectReason::LoggedOut)],
    ]);
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    bot.run().await.unwrap();

    assert_eq!(connector.num_connects(), 2);
}

#[tokio::test]
async fn credentials_survive_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let mut credentials = Credentials::default();
    credentials.insert("me", "4512345678@s.whatsapp.net");

    let connector = ScriptedConnector::new(vec![
        vec![
            Event::CredentialsUpdate(credentials.clone()),
            close(DisconnectReason::ConnectionLost),
        ],
        vec![close(DisconnectReason::LoggedOut)],
    ]);
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    bot.run().await.unwrap();

    let connects = connector.connects.lock().unwrap();

    assert!(connects[0].is_empty());
    assert_eq!(connects[1], credentials);
}

#[tokio::test]
async fn send_failure_keeps_the_session_alive() {
    let dir = tempfile::tempdir().unwrap();
    let client = RecordingClient {
        failing: vec!["flaky".to_string()],
        ..RecordingClient::default()
    };
    let connector = ScriptedConnector::with_client(
        vec![vec![
            open(),
            Event::MessagesUpsert(MessageBatch::notify(vec![
                InboundMessage::from_text("flaky", "!hello"),
                InboundMessage::from_text("steady", "!echo still here"),
            ])),
            Event::MessagesUpsert(MessageBatch::notify(vec![InboundMessage::from_text(
                "steady", "!ping",
            )])),
            close(DisconnectReason::LoggedOut),
        ]],
        client,
    );
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    bot.run().await.unwrap();

    assert_eq!(
        connector.sent(),
        vec![
            ("steady".to_string(), "Echoing: still here".to_string()),
            ("steady".to_string(), "🏓 Pong!".to_string()),
        ]
    );
    assert_eq!(connector.num_connects(), 1);
}

#[tokio::test]
async fn connect_failure_stops_the_bot() {
    let dir = tempfile::tempdir().unwrap();
    let connector = ScriptedConnector::new(vec![]);
    let mut bot = Bot::new(config(&dir), Arc::clone(&connector));

    let result = bot.run().await;

    assert!(matches!(result, Err(Error::Connect(_))));
    assert_eq!(bot.state(), State::Connecting);
}
