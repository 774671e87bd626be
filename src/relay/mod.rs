//! Response-decision engine
//!
//! Everything between "a message arrived" and "a reply was posted": the
//! rotating histories, the trigger gate, persona choice, prompt assembly and
//! the orchestrator that drives them.

pub mod buffer;
pub mod orchestrator;
pub mod persona;
pub mod prompt;
pub mod trigger;

pub use buffer::RotatingBuffer;
pub use orchestrator::{Orchestrator, Outcome};
pub use persona::{PersonaCatalog, PersonaSelector};
pub use trigger::TriggerEvaluator;

/// A chat message as remembered in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sequence: u64,
    pub author: String,
    pub text: String,
    pub reply_to_bot: bool,
}

/// One of the bot's own replies as remembered in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub sequence: u64,
    pub text: String,
}
