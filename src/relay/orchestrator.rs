//! Response orchestrator
//!
//! Owns both history buffers and drives one message at a time through
//! chat filter → history → trigger gate → persona → prompt → generation →
//! reply. Generation failures never reach the chat: a canned fallback line is
//! sent and recorded exactly as a generated reply would be.

use eyre::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::persona::{Clock, PersonaSelector, SystemClock};
use super::trigger::{Reason, TriggerEvaluator};
use super::{InboundMessage, OutboundReply, PersonaCatalog, RotatingBuffer, prompt};
use crate::config::Config;
use crate::generation::Generator;
use crate::redact::redact;
use crate::transport::{BotIdentity, IncomingMessage, ReplySink};

/// What happened to one incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Came from a chat other than the configured one; nothing recorded
    Ignored,
    /// Recorded in history but not answered
    Suppressed(Reason),
    Replied(String),
    FallbackReplied(String),
}

/// Tunables the orchestrator needs from configuration
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// `None` accepts messages from every chat
    pub target_chat: Option<i64>,
    pub history_capacity: usize,
    pub trigger_probability: f64,
    pub fallback_phrase: String,
    pub fallback_responses: Vec<String>,
}

impl RelaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_chat: (config.chat_id != 0).then_some(config.chat_id),
            history_capacity: config.store_updates,
            trigger_probability: config.trigger_probability,
            fallback_phrase: config.fallback_phrase.clone(),
            fallback_responses: config.fallback_responses.clone(),
        }
    }
}

pub struct Orchestrator<G, C = SystemClock>
where
    G: Generator,
    C: Clock,
{
    bot: BotIdentity,
    target_chat: Option<i64>,
    trigger: TriggerEvaluator,
    personas: PersonaSelector<C>,
    generator: G,
    fallback_responses: Vec<String>,
    history: RotatingBuffer<InboundMessage>,
    replies: RotatingBuffer<OutboundReply>,
    rng: StdRng,
    next_inbound: u64,
    next_outbound: u64,
}

impl<G: Generator> Orchestrator<G, SystemClock> {
    pub fn new(bot: BotIdentity, settings: RelaySettings, catalog: PersonaCatalog, generator: G) -> Result<Self> {
        Self::with_parts(
            bot,
            settings,
            PersonaSelector::new(catalog),
            generator,
            StdRng::from_entropy(),
        )
    }
}

impl<G, C> Orchestrator<G, C>
where
    G: Generator,
    C: Clock,
{
    /// Build with an explicit persona selector and gate/fallback generator
    pub fn with_parts(
        bot: BotIdentity,
        settings: RelaySettings,
        personas: PersonaSelector<C>,
        generator: G,
        rng: StdRng,
    ) -> Result<Self> {
        if settings.fallback_responses.is_empty() {
            eyre::bail!("fallback_responses can't be empty");
        }

        let trigger = TriggerEvaluator::new(&bot, settings.trigger_probability, settings.fallback_phrase)?;

        Ok(Self {
            bot,
            target_chat: settings.target_chat,
            trigger,
            personas,
            generator,
            fallback_responses: settings.fallback_responses,
            history: RotatingBuffer::new(settings.history_capacity),
            replies: RotatingBuffer::new(settings.history_capacity),
            rng,
            next_inbound: 0,
            next_outbound: 0,
        })
    }

    pub fn history(&self) -> &RotatingBuffer<InboundMessage> {
        &self.history
    }

    pub fn replies(&self) -> &RotatingBuffer<OutboundReply> {
        &self.replies
    }

    pub fn handle<S: ReplySink + ?Sized>(&mut self, message: &IncomingMessage, sink: &S) -> Outcome {
        if let Some(target) = self.target_chat
            && message.chat_id != target
        {
            log::info!("Message from unauthorized chat: {}", message.chat_id);
            return Outcome::Ignored;
        }

        // Suppressed messages still count as context for later replies
        self.record_inbound(message);

        let decision = self.trigger.evaluate(message, &mut self.rng);
        if !decision.respond {
            log::debug!("Message {} suppressed: {:?}", message.message_id, decision.reason);
            return Outcome::Suppressed(decision.reason);
        }
        log::info!("Responding to message {} ({:?})", message.message_id, decision.reason);

        let (persona_index, persona) = self.personas.select();
        log::debug!("Selected persona {}", persona_index);
        let prompt = prompt::compose(&self.history, &self.replies, persona, &decision.text);
        log::debug!("Request: {}", prompt);

        let (text, generated) = match self.generator.generate(&prompt) {
            Ok(text) => (text, true),
            Err(e) => {
                log::warn!("Error generating response: {}", redact(&format!("{:#}", e)));
                (self.fallback_text(), false)
            }
        };

        if let Err(e) = sink.send_reply(message.chat_id, &text, message.message_id) {
            log::error!("Error sending message: {}", redact(&format!("{:#}", e)));
        }
        self.record_reply(text.clone());

        if generated {
            Outcome::Replied(text)
        } else {
            Outcome::FallbackReplied(text)
        }
    }

    fn fallback_text(&mut self) -> String {
        self.fallback_responses
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }

    fn record_inbound(&mut self, message: &IncomingMessage) {
        self.history.insert(InboundMessage {
            sequence: self.next_inbound,
            author: message.author.username.clone(),
            text: message.text.clone(),
            reply_to_bot: message.is_reply_to(&self.bot),
        });
        self.next_inbound += 1;
    }

    fn record_reply(&mut self, text: String) {
        self.replies.insert(OutboundReply {
            sequence: self.next_outbound,
            text,
        });
        self.next_outbound += 1;
    }
}
