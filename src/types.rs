//! Common types used throughout the relay.

use serde::{Deserialize, Serialize};

/// Role of a message sent to the completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the human user
    User,
    /// Message from the AI assistant
    Assistant,
    /// System prompt or instructions
    System,
}

/// Where a reply for an event has to be delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyTarget {
    /// Per-conversation webhook URL handed out by the chat platform
    pub webhook: Option<String>,
    /// Expiry of the webhook in milliseconds since the Unix epoch
    pub expires_at_ms: Option<i64>,
    /// Platform user id to @-mention in the reply
    pub mention_user_id: Option<String>,
}

/// One inbound chat message, already decoded from the platform payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatEvent {
    pub sender_id: String,
    pub sender_nick: String,
    pub text: String,
    pub reply_to: ReplyTarget,
}

impl ChatEvent {
    /// Builds an event with no delivery address.
    pub fn new(
        sender_id: impl Into<String>,
        sender_nick: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_nick: sender_nick.into(),
            text: text.into(),
            reply_to: ReplyTarget::default(),
        }
    }
}
