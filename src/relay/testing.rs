//! In-memory doubles for the relay's capability traits.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::CompletionProvider;
use crate::error::{RelayError, Result};
use crate::types::ChatEvent;

use super::ReplySink;

/// Returns a fixed reply and records every prompt it receives.
pub(crate) struct RecordingCompletion {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingCompletion {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock poisoned").clone()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Fails every call the way an overloaded backend does.
pub(crate) struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RelayError::CompletionApi {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            message: "overloaded".to_string(),
        })
    }
}

/// Records delivered replies, optionally failing every delivery.
#[derive(Default)]
pub(crate) struct RecordingSink {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// `(sender_id, text)` pairs in delivery order.
    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock poisoned").clone()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn reply(&self, event: &ChatEvent, text: &str) -> Result<()> {
        if self.fail {
            return Err(RelayError::Delivery("webhook rejected the reply".to_string()));
        }
        self.sent
            .lock()
            .expect("sent lock poisoned")
            .push((event.sender_id.clone(), text.to_string()));
        Ok(())
    }
}
