//! Telegram Bot API transport
//!
//! Long-polls `getUpdates`, replies with `sendMessage` and resolves the bot's
//! own identity with `getMe`. Every response is wrapped in the Bot API
//! envelope `{ok, result, description}`.

use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ureq::Agent;

use super::{Author, BotIdentity, ChatTransport, IncomingMessage, ParentMessage, ReplySink};
use crate::config::Config;

/// Extra time the HTTP client waits beyond the long-poll window
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            eyre::bail!(
                "Telegram {} failed: {}",
                method,
                self.description.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        self.result
            .ok_or_else(|| eyre::eyre!("Telegram {} returned no result", method))
    }
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
}

impl User {
    fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    reply_to_message_id: i64,
}

impl Message {
    /// Only text messages are relayed
    fn into_incoming(self) -> Option<IncomingMessage> {
        let text = self.text?;
        let author = match &self.from {
            Some(user) => Author {
                id: user.id,
                username: user.display_name(),
            },
            None => Author {
                id: 0,
                username: "unknown".to_string(),
            },
        };
        let reply_to = self.reply_to_message.map(|parent| ParentMessage {
            author_id: parent.from.as_ref().map(|u| u.id),
            text: parent.text.unwrap_or_default(),
        });

        Some(IncomingMessage {
            message_id: self.message_id,
            chat_id: self.chat.id,
            author,
            text,
            reply_to,
        })
    }
}

pub struct TelegramTransport {
    agent: Agent,
    base_url: String,
    poll_timeout: Duration,
    offset: i64,
}

impl TelegramTransport {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(poll_timeout + POLL_GRACE))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout,
            offset: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.telegram_api_url,
            &config.telegram_token,
            Duration::from_secs(config.poll_timeout_secs),
        )
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn read<T: DeserializeOwned>(method: &str, mut response: ureq::http::Response<ureq::Body>) -> Result<T> {
        let body = response
            .body_mut()
            .read_to_string()
            .context(format!("Failed to read {} response", method))?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).context(format!("Failed to parse {} response", method))?;
        envelope.into_result(method)
    }
}

impl ReplySink for TelegramTransport {
    fn send_reply(&self, chat_id: i64, text: &str, reply_to_message_id: i64) -> Result<()> {
        let request = SendMessage {
            chat_id,
            text,
            reply_to_message_id,
        };
        let request_body = serde_json::to_string(&request).context("Failed to serialize sendMessage")?;

        let response = self
            .agent
            .post(&self.url("sendMessage"))
            .header("Content-Type", "application/json")
            .send(request_body.as_bytes())
            .context("Failed to call sendMessage")?;

        let _: serde_json::Value = Self::read("sendMessage", response)?;
        Ok(())
    }
}

impl ChatTransport for TelegramTransport {
    fn identity(&self) -> Result<BotIdentity> {
        let response = self.agent.get(&self.url("getMe")).call().context("Failed to call getMe")?;
        let user: User = Self::read("getMe", response)?;

        Ok(BotIdentity {
            id: user.id,
            username: user.username.unwrap_or_default(),
        })
    }

    fn poll(&mut self) -> Result<Vec<IncomingMessage>> {
        let response = self
            .agent
            .get(&self.url("getUpdates"))
            .query("offset", self.offset.to_string())
            .query("timeout", self.poll_timeout.as_secs().to_string())
            .call()
            .context("Failed to call getUpdates")?;
        let updates: Vec<serde_json::Value> = Self::read("getUpdates", response)?;

        // Advance past the whole batch even if some updates fail to parse
        if let Some(last) = updates
            .iter()
            .filter_map(|u| u.get("update_id").and_then(serde_json::Value::as_i64))
            .max()
        {
            self.offset = last + 1;
        }

        Ok(updates
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Update>(raw) {
                Ok(update) => update.message,
                Err(e) => {
                    log::warn!("Skipping malformed update: {}", e);
                    None
                }
            })
            .filter_map(Message::into_incoming)
            .collect())
    }
}
