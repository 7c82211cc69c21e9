//! Inbound message records as delivered by the external client.

use serde::{Deserialize, Serialize};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Distinguishes live delivery from history backfill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    /// Messages that arrived in real time.
    Notify,
    /// Messages replayed from history sync.
    Append,
}

/// A group of inbound messages delivered together.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageBatch {
    /// The batch label.
    #[serde(rename = "type")]
    pub kind: BatchKind,
    /// The messages, in delivery order.
    pub messages: Vec<InboundMessage>,
}

impl MessageBatch {
    /// Creates a live batch.
    #[must_use]
    pub const fn notify(messages: Vec<InboundMessage>) -> MessageBatch {
        MessageBatch {
            kind: BatchKind::Notify,
            messages,
        }
    }

    /// Creates a history-sync batch.
    #[must_use]
    pub const fn append(messages: Vec<InboundMessage>) -> MessageBatch {
        MessageBatch {
            kind: BatchKind::Append,
            messages,
        }
    }
}

/// Identifies where a message came from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// The chat the message was sent in, and where replies are addressed.
    pub remote_jid: String,
    /// Whether the message was sent by the bot's own account.
    pub from_me: bool,
}

/// The payload of a message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    /// A plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    /// An extended text body, e.g. a quoted reply or a message with a link preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text_message: Option<ExtendedText>,
}

/// An extended text body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtendedText {
    /// The text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A single inbound message.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct InboundMessage {
    /// The message key.
    pub key: MessageKey,
    /// The message payload. Reactions and protocol events carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageContent>,
}

impl InboundMessage {
    /// Creates a plain text message from `sender`.
    pub fn from_text(sender: impl Into<String>, text: impl Into<String>) -> InboundMessage {
        InboundMessage {
            key: MessageKey {
                remote_jid: sender.into(),
                from_me: false,
            },
            message: Some(MessageContent {
                conversation: Some(text.into()),
                extended_text_message: None,
            }),
        }
    }

    /// Marks the message as sent by the bot itself.
    #[must_use]
    pub fn sent_by_me(mut self) -> InboundMessage {
        self.key.from_me = true;
        self
    }

    /// The identifier replies are addressed to.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.key.remote_jid
    }

    /// Returns the trimmed display text of the message.
    ///
    /// A non-empty plain body is preferred over the extended body. Any other payload shape
    /// yields an empty string. A leading or trailing byte order mark counts as whitespace.
    #[must_use]
    pub fn text(&self) -> &str {
        self.message
            .as_ref()
            .and_then(|content| {
                content
                    .conversation
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .or_else(|| {
                        content
                            .extended_text_message
                            .as_ref()
                            .and_then(|ext| ext.text.as_deref())
                            .filter(|text| !text.is_empty())
                    })
            })
            .unwrap_or("")
            .trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK)
    }
}
