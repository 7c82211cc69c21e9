//! Handlers for the events a session produces.
//!
//! The handlers don't hold any state of their own, which lets them be driven directly by tests
//! without a live connection.

use tracing::{debug, error, info, instrument, trace, warn};

use crate::auth::{CredentialSaver, Credentials};
use crate::client::{Client, OutgoingMessage};
use crate::command;
use crate::event::{Connection, ConnectionUpdate, Disconnect, DisconnectReason};
use crate::message::{BatchKind, MessageBatch};
use crate::pairing;

/// What the runner should do after a connection update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Nothing changes; keep draining events.
    Continue,
    /// The connection opened.
    Opened,
    /// The connection closed for a recoverable reason and the session should be restarted.
    Reconnect(Disconnect),
    /// The session was logged out and must not be restarted.
    LoggedOut(Disconnect),
}

/// Handles a connection state change.
///
/// A pairing payload is drawn to the terminal so the operator can scan it.
#[must_use]
pub fn handle_connection_update(update: &ConnectionUpdate) -> ConnectionOutcome {
    if let Some(qr) = &update.qr {
        match pairing::render(qr) {
            Some(code) => {
                println!("{code}");
                info!("scan this QR code with your phone (Linked Devices) to pair the bot");
            }
            None => warn!(len = qr.len(), "pairing payload is too long to render"),
        }
    }

    match update.connection {
        Some(Connection::Close) => {
            let disconnect = update.last_disconnect.clone().unwrap_or_else(|| {
                Disconnect::new(DisconnectReason::Other, "connection closed without a reason")
            });
            let reconnect = disconnect.reason.should_reconnect();

            info!(%disconnect, %reconnect, "connection closed");

            if reconnect {
                ConnectionOutcome::Reconnect(disconnect)
            } else {
                ConnectionOutcome::LoggedOut(disconnect)
            }
        }
        Some(Connection::Open) => {
            info!("🎉 connection opened, ready to serve");

            ConnectionOutcome::Opened
        }
        Some(Connection::Connecting) => {
            debug!("connecting");

            ConnectionOutcome::Continue
        }
        None => ConnectionOutcome::Continue,
    }
}

/// Forwards updated credentials to the persistence callback.
///
/// A failure to persist is logged; the session keeps running on the in-memory credentials.
pub async fn handle_credentials_update(saver: &CredentialSaver, credentials: &Credentials) {
    if let Err(err) = saver.save(credentials).await {
        error!(
            folder = %saver.folder().display(),
            error = ?err,
            "could not persist credentials"
        );
    }
}

/// Counters describing how a batch was processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Replies that were delivered.
    pub replied: usize,
    /// Replies that could not be delivered.
    pub failed: usize,
    /// Messages that were skipped or matched no command.
    pub ignored: usize,
}

/// Answers every command in a live batch, in order.
///
/// Replies are sent one at a time. A failed send is logged and the next message is processed as
/// usual.
#[instrument(skip_all, fields(kind = ?batch.kind, num_messages = batch.messages.len()))]
pub async fn handle_messages_upsert(client: &dyn Client, batch: &MessageBatch) -> BatchSummary {
    let mut summary = BatchSummary::default();

    if batch.kind != BatchKind::Notify {
        trace!("ignoring history batch");
        summary.ignored = batch.messages.len();

        return summary;
    }

    for msg in &batch.messages {
        if msg.key.from_me || msg.message.is_none() {
            debug!(
                from_me = msg.key.from_me,
                has_content = msg.message.is_some(),
                "message ignored"
            );
            summary.ignored += 1;

            continue;
        }

        let sender = msg.sender();
        let text = msg.text();

        debug!(%sender, %text, "processing message");

        let Some(reply) = command::dispatch(text) else {
            debug!(%text, "no command matched");
            summary.ignored += 1;

            continue;
        };

        debug!(command = reply.command, %sender, "matched command");

        match client
            .send_message(sender, OutgoingMessage::text(reply.text))
            .await
        {
            Ok(()) => {
                debug!(command = reply.command, "sent reply");
                summary.replied += 1;
            }
            Err(err) => {
                error!(command = reply.command, %sender, error = ?err, "could not send reply");
                summary.failed += 1;
            }
        }
    }

    summary
}
