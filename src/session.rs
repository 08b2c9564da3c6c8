//! Per-user conversation memory.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

/// Upper bound on a stored context and on an outbound prompt, in characters.
pub const MAX_CONTEXT_CHARS: usize = 4000;

/// Keeps the first `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &mut String, max: usize) {
    if let Some((byte_index, _)) = text.char_indices().nth(max) {
        text.truncate(byte_index);
    }
}

/// Conversation memory keyed by user id.
///
/// Every method is individually atomic; callers never hold a lock across
/// their own awaits.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored history for `user_id`, or an empty string.
    async fn get_context(&self, user_id: &str) -> String;

    /// Appends `prompt` and `reply` to the history of `user_id`, keeping at
    /// most [`MAX_CONTEXT_CHARS`] leading characters.
    async fn set_context(&self, user_id: &str, prompt: &str, reply: &str);

    /// Clears the history of `user_id` if `message` is the clear command.
    ///
    /// Returns `true` when the message was the command.
    async fn clear_context(&self, user_id: &str, message: &str) -> bool;
}

/// Process-lifetime store backed by a locked `HashMap`.
#[derive(Debug)]
pub struct InMemorySessionStore {
    clear_command: String,
    contexts: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(clear_command: impl Into<String>) -> Self {
        Self {
            clear_command: clear_command.into().trim().to_string(),
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Number of users with stored history.
    pub async fn len(&self) -> usize {
        self.contexts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.read().await.is_empty()
    }

    fn is_clear_command(&self, message: &str) -> bool {
        message.trim() == self.clear_command
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_context(&self, user_id: &str) -> String {
        self.contexts
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn set_context(&self, user_id: &str, prompt: &str, reply: &str) {
        let mut contexts = self.contexts.write().await;
        let history = contexts.entry(user_id.to_string()).or_default();
        history.push_str(prompt);
        history.push_str(reply);
        truncate_chars(history, MAX_CONTEXT_CHARS);
        debug!(
            "Stored {} characters of context for user {}",
            history.chars().count(),
            user_id
        );
    }

    async fn clear_context(&self, user_id: &str, message: &str) -> bool {
        if !self.is_clear_command(message) {
            return false;
        }
        self.contexts.write().await.remove(user_id);
        debug!("Cleared context for user {user_id}");
        true
    }
}
