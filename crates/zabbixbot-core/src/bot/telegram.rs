//! Telegram Bot API client using raw reqwest.
//!
//! Long-polls `getUpdates` and answers via `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::command::BotCommand;
use super::{Channel, ChannelError, ChannelEvent, OutboundMessage};
use crate::config::TelegramConfig;

/// Maximum message length for Telegram (we chunk below this).
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Long-poll timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram Bot API client.
pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    allowed_chat_ids: Vec<i64>,
    client: reqwest::Client,
}

// --- Telegram API response types ---

#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

impl TelegramChannel {
    /// Create a client from the Telegram configuration.
    pub fn new(config: &TelegramConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS * 2))
            .build()?;

        Ok(Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            allowed_chat_ids: config.allowed_chat_ids.clone(),
            client,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }

    /// Parse a message into a ChannelEvent.
    fn parse_message(msg: &TgMessage) -> Option<ChannelEvent> {
        let text = msg.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }

        let user_name = msg
            .from
            .as_ref()
            .map(|user| user.username.clone().unwrap_or_else(|| user.first_name.clone()))
            .unwrap_or_default();

        if let Some(rest) = text.strip_prefix('/') {
            // "/agent_problems now" -> "agent_problems"
            let command = rest.split_whitespace().next().unwrap_or_default();
            // "/start@zabbixbot" -> "start"
            let command = command.split('@').next().unwrap_or(command);
            Some(ChannelEvent::Command {
                chat_id: msg.chat.id,
                message_id: msg.message_id,
                user_name,
                command: command.to_owned(),
                text: text.to_owned(),
            })
        } else {
            Some(ChannelEvent::Message {
                chat_id: msg.chat.id,
                message_id: msg.message_id,
                user_name,
                text: text.to_owned(),
            })
        }
    }

    /// Long-poll for updates from Telegram.
    async fn get_updates(&self, offset: i64) -> Result<Vec<TgUpdate>, ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", POLL_TIMEOUT_SECS.to_string()),
            ])
            .send()
            .await?;

        let body: TgResponse<Vec<TgUpdate>> = resp.json().await?;

        if !body.ok {
            let desc = body.description.unwrap_or_default();
            return Err(ChannelError::Api(format!("getUpdates failed: {desc}")));
        }

        Ok(body.result.unwrap_or_default())
    }

    /// Register the command menu shown by Telegram clients.
    pub async fn set_commands(&self) -> Result<(), ChannelError> {
        let commands: Vec<serde_json::Value> = BotCommand::ALL
            .iter()
            .map(|command| {
                serde_json::json!({
                    "command": command.name(),
                    "description": command.description(),
                })
            })
            .collect();

        let resp = self
            .client
            .post(self.api_url("setMyCommands"))
            .json(&serde_json::json!({ "commands": commands }))
            .send()
            .await?;

        let body: TgResponse<serde_json::Value> = resp.json().await?;
        if !body.ok {
            let desc = body.description.unwrap_or_default();
            return Err(ChannelError::Api(format!("setMyCommands failed: {desc}")));
        }
        Ok(())
    }

    /// Send a text message, chunking if necessary.
    async fn send_text(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        for chunk in chunk_message(&msg.text) {
            let mut payload = serde_json::json!({
                "chat_id": msg.chat_id,
                "text": chunk,
            });
            if msg.markdown {
                payload["parse_mode"] = serde_json::json!("Markdown");
            }
            if let Some(reply_to) = msg.reply_to {
                payload["reply_to_message_id"] = serde_json::json!(reply_to);
            }

            let body = self.post_message(&payload).await?;
            if body.ok {
                continue;
            }

            if !msg.markdown {
                let desc = body.description.unwrap_or_default();
                return Err(ChannelError::Api(format!("sendMessage failed: {desc}")));
            }

            // Retry without Markdown if parse_mode fails.
            warn!(
                chat_id = msg.chat_id,
                description = body.description.as_deref().unwrap_or_default(),
                "Markdown rejected, resending as plain text"
            );
            if let Some(object) = payload.as_object_mut() {
                object.remove("parse_mode");
            }

            let body = self.post_message(&payload).await?;
            if !body.ok {
                let desc = body.description.unwrap_or_default();
                return Err(ChannelError::Api(format!("sendMessage failed: {desc}")));
            }
        }
        Ok(())
    }

    async fn post_message(
        &self,
        payload: &serde_json::Value,
    ) -> Result<TgResponse<serde_json::Value>, ChannelError> {
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(payload)
            .send()
            .await?;

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn run(&self, tx: Sender<ChannelEvent>, cancel: CancellationToken) {
        let mut offset: i64 = 0;

        info!("Telegram polling started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let updates = tokio::select! {
                () = cancel.cancelled() => break,
                result = self.get_updates(offset) => {
                    match result {
                        Ok(updates) => updates,
                        Err(e) => {
                            error!(error = %e, "Telegram poll failed");
                            tokio::select! {
                                () = cancel.cancelled() => break,
                                () = tokio::time::sleep(POLL_BACKOFF) => {}
                            }
                            continue;
                        }
                    }
                }
            };

            for update in updates {
                offset = update.update_id + 1;

                let Some(msg) = update.message else {
                    continue;
                };

                if !self.is_chat_allowed(msg.chat.id) {
                    warn!(chat_id = msg.chat.id, "Ignoring message from unauthorized chat");
                    continue;
                }

                if let Some(event) = Self::parse_message(&msg) {
                    debug!(chat_id = msg.chat.id, "Received message");
                    if tx.send(event).await.is_err() {
                        // Receiver dropped, shut down.
                        return;
                    }
                }
            }
        }

        info!("Telegram polling stopped");
    }

    async fn send_message(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        self.send_text(msg).await
    }
}

/// Split a message into chunks that fit within Telegram's limit.
pub fn chunk_message(text: &str) -> Vec<&str> {
    if text.len() <= MAX_MESSAGE_LEN {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= MAX_MESSAGE_LEN {
            chunks.push(remaining);
            break;
        }

        // Largest char boundary within the limit.
        let mut limit = MAX_MESSAGE_LEN;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }

        // Try to split at a newline within the limit.
        let split_at = remaining[..limit].rfind('\n').unwrap_or(limit);
        let split_at = if split_at == 0 { limit } else { split_at };

        let (chunk, rest) = remaining.split_at(split_at);
        chunks.push(chunk);
        // Skip the newline we split on.
        remaining = rest.strip_prefix('\n').unwrap_or(rest);
    }

    chunks
}
