//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::types::MessageRole;

use super::CompletionProvider;

// Chat messages are short; 512 tokens keeps replies readable in a group chat
const MAX_TOKENS: u32 = 512;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Message {
    role: MessageRole,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

pub struct OpenAiClient {
    api_key: String,
    api_url: Url,
    client: reqwest::Client,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAiClient {
    /// Builds a client whose every request is bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.completion_timeout)
            .build()?;
        Ok(Self {
            api_key: config.completion_api_key.clone(),
            api_url: config.completion_api_url.clone(),
            client,
            model: config.completion_model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    fn build_messages(&self, prompt: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(Message {
                role: MessageRole::System,
                content: Some(system_prompt.clone()),
            });
        }
        messages.push(Message {
            role: MessageRole::User,
            content: Some(prompt.to_string()),
        });
        messages
    }
}

/// Pulls the text of the first choice; a null content is an empty reply.
fn extract_reply(response: CompletionResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::CompletionResponse("No choices in response".to_string()))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(
            "Sending {} characters to completion API",
            prompt.chars().count()
        );

        let request = CompletionRequest {
            model: &self.model,
            messages: self.build_messages(prompt),
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(RelayError::CompletionApi { status, message });
        }

        let api_response: CompletionResponse = response.json().await?;
        let reply = extract_reply(api_response)?;

        debug!(
            "Received {} characters from completion API",
            reply.chars().count()
        );
        Ok(reply)
    }
}
