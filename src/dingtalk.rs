//! DingTalk outgoing-robot adapters.
//!
//! The robot POSTs every message that mentions it to our webhook and hands
//! us a short-lived per-conversation `sessionWebhook` to answer on.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};
use crate::relay::ReplySink;
use crate::types::{ChatEvent, ReplyTarget};

/// Callback body sent by the DingTalk outgoing robot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotMessage {
    pub sender_id: String,
    #[serde(default)]
    pub sender_nick: String,
    pub sender_staff_id: Option<String>,
    #[serde(rename = "msgtype")]
    pub msg_type: Option<String>,
    pub text: Option<TextContent>,
    pub session_webhook: Option<String>,
    pub session_webhook_expired_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub content: String,
}

impl RobotMessage {
    /// Decodes a raw callback body.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Payload`] when the body is not a robot message.
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Plain text callbacks are the only ones the relay answers. A callback
    /// without a `msgtype` is treated as text.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.msg_type.as_deref().is_none_or(|kind| kind == "text")
    }

    #[must_use]
    pub fn into_event(self) -> ChatEvent {
        ChatEvent {
            sender_id: self.sender_id,
            sender_nick: self.sender_nick,
            text: self.text.map(|text| text.content).unwrap_or_default(),
            reply_to: ReplyTarget {
                webhook: self.session_webhook,
                expires_at_ms: self.session_webhook_expired_time,
                mention_user_id: self.sender_staff_id,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TextReply<'a> {
    msgtype: &'static str,
    text: TextBody<'a>,
    at: AtBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AtBody<'a> {
    at_user_ids: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

fn text_reply<'a>(target: &'a ReplyTarget, text: &'a str) -> TextReply<'a> {
    TextReply {
        msgtype: "text",
        text: TextBody { content: text },
        at: AtBody {
            at_user_ids: target.mention_user_id.as_deref().into_iter().collect(),
        },
    }
}

/// Resolves the webhook to answer on, rejecting missing or expired ones.
fn reply_webhook(target: &ReplyTarget, now_ms: i64) -> Result<&str> {
    let webhook = target
        .webhook
        .as_deref()
        .ok_or_else(|| RelayError::Delivery("event has no session webhook".to_string()))?;
    if let Some(expires_at) = target.expires_at_ms
        && expires_at <= now_ms
    {
        return Err(RelayError::Delivery(format!(
            "session webhook expired at {expires_at}"
        )));
    }
    Ok(webhook)
}

/// Sends replies through the event's session webhook.
pub struct DingTalkReplier {
    client: reqwest::Client,
}

impl DingTalkReplier {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplySink for DingTalkReplier {
    async fn reply(&self, event: &ChatEvent, text: &str) -> Result<()> {
        let webhook = reply_webhook(&event.reply_to, Utc::now().timestamp_millis())?;
        debug!(
            "Posting {} characters to session webhook",
            text.chars().count()
        );

        let response = self
            .client
            .post(webhook)
            .json(&text_reply(&event.reply_to, text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Delivery(format!(
                "session webhook returned {status}"
            )));
        }

        let body: WebhookResponse = response.json().await?;
        if body.errcode != 0 {
            return Err(RelayError::Delivery(format!(
                "DingTalk error {}: {}",
                body.errcode, body.errmsg
            )));
        }
        Ok(())
    }
}
