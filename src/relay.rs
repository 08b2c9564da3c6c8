//! Request orchestration: clear-or-continue, prompt assembly, completion and
//! context update for one inbound chat message.

mod dispatch;
mod prompt;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use strum::IntoStaticStr;

use crate::completion::CompletionProvider;
use crate::error::{RelayError, Result};
use crate::session::SessionStore;
use crate::types::ChatEvent;

pub use dispatch::dispatch;
pub use prompt::{clean_text, mention_prefix, request_text};

/// Reply sent after a clear command.
pub const CONTEXT_CLEARED_REPLY: &str = "Context cleared, go ahead and ask your next question.";

/// Reply sent when the completion backend fails.
pub const OVERLOADED_REPLY: &str =
    "The assistant is overloaded right now, please try again in a little while.";

/// Delivers a reply back to the chat platform.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn reply(&self, event: &ChatEvent, text: &str) -> Result<()>;
}

/// What the relay decided for one event.
#[derive(Debug, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    /// The message was the clear command.
    Cleared(String),
    /// The backend answered and the context was updated.
    Answered(String),
    /// The backend failed; `cause` is kept for logging only.
    Apologized { reply: String, cause: RelayError },
    /// Nothing to send.
    Silent,
}

impl Outcome {
    /// Text to deliver, if any.
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        match self {
            Outcome::Cleared(reply)
            | Outcome::Answered(reply)
            | Outcome::Apologized { reply, .. } => Some(reply),
            Outcome::Silent => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Stateless orchestrator over an injected backend and session store.
#[derive(Clone)]
pub struct Relay {
    completion: Arc<dyn CompletionProvider>,
    sessions: Arc<dyn SessionStore>,
}

impl Relay {
    pub fn new(completion: Arc<dyn CompletionProvider>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            completion,
            sessions,
        }
    }

    /// Decides and produces the reply for one event.
    ///
    /// The session store is never locked while the backend call is in flight.
    pub async fn handle_event(&self, event: &ChatEvent) -> Outcome {
        let prefix = mention_prefix(&event.sender_nick);

        if self
            .sessions
            .clear_context(&event.sender_id, &event.text)
            .await
        {
            info!("Cleared context for {}", event.sender_nick);
            return Outcome::Cleared(format!("{prefix}{CONTEXT_CLEARED_REPLY}"));
        }

        let context = self.sessions.get_context(&event.sender_id).await;
        let Some(request) = request_text(&context, &event.text, &event.sender_nick) else {
            debug!("Empty request from {}, nothing to do", event.sender_nick);
            return Outcome::Silent;
        };

        let reply = match self.completion.complete(&request).await {
            Ok(reply) => reply,
            Err(cause) => {
                return Outcome::Apologized {
                    reply: format!("{prefix}{OVERLOADED_REPLY}"),
                    cause,
                };
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            debug!("Completion backend returned an empty reply");
            return Outcome::Silent;
        }

        self.sessions
            .set_context(&event.sender_id, &request, reply)
            .await;
        Outcome::Answered(format!("{prefix}{reply}"))
    }
}
