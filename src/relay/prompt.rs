//! Prompt assembly
//!
//! The prompt is plain text in a fixed order: chat history, the bot's own
//! reply history, the persona instruction, then the message being answered.
//! Every history entry carries its position so the model can tell turns apart.

use super::{InboundMessage, OutboundReply, RotatingBuffer};

const ENTRY_SEPARATOR: &str = " ;";

/// Render chat history as indexed entries, oldest first
pub fn chat_context(history: &RotatingBuffer<InboundMessage>) -> String {
    history
        .iter()
        .enumerate()
        .map(|(i, m)| format!("message from user {} number {}: {}{}", m.author, i, m.text, ENTRY_SEPARATOR))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the bot's reply history as indexed entries, oldest first
pub fn reply_context(replies: &RotatingBuffer<OutboundReply>) -> String {
    replies
        .iter()
        .enumerate()
        .map(|(i, r)| format!("reply {}: {}{}", i, r.text, ENTRY_SEPARATOR))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn compose(
    history: &RotatingBuffer<InboundMessage>,
    replies: &RotatingBuffer<OutboundReply>,
    persona: &str,
    message: &str,
) -> String {
    format!(
        "Using the chat history where possible - {}. \
         And your own replies in the chat (try to be original and do not repeat yourself, \
         your reply history is only for context) - {}. \
         How to respond - {}. \
         The message to respond to - {}",
        chat_context(history),
        reply_context(replies),
        persona.trim(),
        message
    )
}
