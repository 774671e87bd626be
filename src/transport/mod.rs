//! Chat transport
//!
//! The relay only needs three things from a chat platform: who the bot is,
//! a stream of incoming messages, and a way to post a reply. Telegram is the
//! one platform implemented.

use eyre::Result;

pub mod telegram;

pub use telegram::TelegramTransport;

/// The bot account as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub username: String,
}

/// Author of a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub username: String,
}

/// The message an incoming message replies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentMessage {
    pub author_id: Option<i64>,
    pub text: String,
}

/// A text message received from the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub author: Author,
    pub text: String,
    pub reply_to: Option<ParentMessage>,
}

impl IncomingMessage {
    pub fn is_reply_to(&self, bot: &BotIdentity) -> bool {
        self.reply_to
            .as_ref()
            .and_then(|parent| parent.author_id)
            .is_some_and(|id| id == bot.id)
    }
}

/// Posts replies into a chat
pub trait ReplySink {
    fn send_reply(&self, chat_id: i64, text: &str, reply_to_message_id: i64) -> Result<()>;
}

/// Full transport: identity, inbound stream and replies
pub trait ChatTransport: ReplySink {
    fn identity(&self) -> Result<BotIdentity>;

    /// Block until the next batch of messages arrives (may be empty)
    fn poll(&mut self) -> Result<Vec<IncomingMessage>>;
}
