//! Trigger gate
//!
//! Decides per message whether the bot answers, and produces the text that
//! is handed to the prompt composer.

use eyre::{Context, Result};
use rand::Rng;
use regex::{Regex, RegexBuilder};

use crate::transport::{BotIdentity, IncomingMessage};

/// Messages shorter than this are never answered
pub const MIN_MESSAGE_CHARS: usize = 5;

/// A mention with less text than this left is replaced by the fallback phrase
pub const MIN_MENTION_TEXT_CHARS: usize = 3;

pub const DEFAULT_FALLBACK_PHRASE: &str = "you are a pathetic bot, why do you exist";

/// Why the gate opened or stayed shut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    TooShort,
    Mentioned,
    ReplyToBot,
    Chance,
    NotSelected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub respond: bool,
    pub reason: Reason,
    /// Text to answer; only meaningful when `respond` is true
    pub text: String,
}

impl Decision {
    fn suppressed(reason: Reason) -> Self {
        Self {
            respond: false,
            reason,
            text: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerEvaluator {
    bot: BotIdentity,
    /// Case-insensitive `@username`; `None` when the bot has no username
    mention: Option<Regex>,
    probability: f64,
    fallback_phrase: String,
}

impl TriggerEvaluator {
    pub fn new(bot: &BotIdentity, probability: f64, fallback_phrase: impl Into<String>) -> Result<Self> {
        let mention = if bot.username.is_empty() {
            None
        } else {
            let pattern = regex::escape(&format!("@{}", bot.username));
            Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .context("Failed to build mention pattern")?,
            )
        };

        Ok(Self {
            bot: bot.clone(),
            mention,
            probability,
            fallback_phrase: fallback_phrase.into(),
        })
    }

    pub fn evaluate<R: Rng + ?Sized>(&self, message: &IncomingMessage, rng: &mut R) -> Decision {
        if message.text.chars().count() < MIN_MESSAGE_CHARS {
            return Decision::suppressed(Reason::TooShort);
        }

        let mention = self.mention.as_ref().filter(|re| re.is_match(&message.text));
        let reply_to_bot = message.is_reply_to(&self.bot);

        // Only draw when nothing addresses the bot directly
        let reason = if mention.is_some() {
            Reason::Mentioned
        } else if reply_to_bot {
            Reason::ReplyToBot
        } else if self.probability > 0.0 && rng.r#gen::<f64>() <= self.probability {
            Reason::Chance
        } else {
            return Decision::suppressed(Reason::NotSelected);
        };

        let text = match mention {
            Some(re) => self.normalize_mention(message, re),
            None => message.text.clone(),
        };

        Decision {
            respond: true,
            reason,
            text,
        }
    }

    fn normalize_mention(&self, message: &IncomingMessage, mention: &Regex) -> String {
        let mut text = mention.replace_all(&message.text, "").trim().to_string();

        if text.chars().count() < MIN_MENTION_TEXT_CHARS {
            text = self.fallback_phrase.clone();
        }

        if let Some(parent) = &message.reply_to
            && !parent.text.trim().is_empty()
        {
            text.push(' ');
            text.push_str(parent.text.trim());
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Author, ParentMessage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const BOT_ID: i64 = 1000;

    fn bot() -> BotIdentity {
        BotIdentity {
            id: BOT_ID,
            username: "BotName".to_string(),
        }
    }

    fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            message_id: 10,
            chat_id: 42,
            author: Author {
                id: 7,
                username: "alice".to_string(),
            },
            text: text.to_string(),
            reply_to: None,
        }
    }

    fn reply(text: &str, parent_author: i64, parent_text: &str) -> IncomingMessage {
        IncomingMessage {
            reply_to: Some(ParentMessage {
                author_id: Some(parent_author),
                text: parent_text.to_string(),
            }),
            ..message(text)
        }
    }

    fn evaluator(probability: f64) -> TriggerEvaluator {
        TriggerEvaluator::new(&bot(), probability, DEFAULT_FALLBACK_PHRASE).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_short_message_never_triggers() {
        let evaluator = evaluator(1.0);
        for text in ["@Bot", "hey", "", "abcd"] {
            let decision = evaluator.evaluate(&reply(text, BOT_ID, "parent"), &mut rng());
            assert!(!decision.respond, "{:?} should not trigger", text);
            assert_eq!(decision.reason, Reason::TooShort);
        }
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Four Cyrillic letters are eight bytes but still too short
        let decision = evaluator(1.0).evaluate(&message("орки"), &mut rng());
        assert!(!decision.respond);
    }

    #[test]
    fn test_mention_always_triggers() {
        let decision = evaluator(0.0).evaluate(&message("hey @botname what is the warp"), &mut rng());
        assert!(decision.respond);
        assert_eq!(decision.reason, Reason::Mentioned);
    }

    #[test]
    fn test_reply_to_bot_always_triggers() {
        let decision = evaluator(0.0).evaluate(&reply("and what then?", BOT_ID, "old reply"), &mut rng());
        assert!(decision.respond);
        assert_eq!(decision.reason, Reason::ReplyToBot);
        assert_eq!(decision.text, "and what then?");
    }

    #[test]
    fn test_reply_to_other_user_does_not_force_trigger() {
        let decision = evaluator(0.0).evaluate(&reply("and what then?", 7, "old message"), &mut rng());
        assert!(!decision.respond);
        assert_eq!(decision.reason, Reason::NotSelected);
    }

    #[test]
    fn test_zero_probability_never_triggers_unaddressed() {
        let evaluator = evaluator(0.0);
        let mut rng = rng();
        for _ in 0..1000 {
            assert!(!evaluator.evaluate(&message("just chatting here"), &mut rng).respond);
        }
    }

    #[test]
    fn test_full_probability_always_triggers() {
        let evaluator = evaluator(1.0);
        let mut rng = rng();
        for _ in 0..100 {
            let decision = evaluator.evaluate(&message("just chatting here"), &mut rng);
            assert!(decision.respond);
            assert_eq!(decision.reason, Reason::Chance);
            assert_eq!(decision.text, "just chatting here");
        }
    }

    #[test]
    fn test_probability_is_roughly_respected() {
        let evaluator = evaluator(0.3);
        let mut rng = rng();
        let hits = (0..10_000)
            .filter(|_| evaluator.evaluate(&message("just chatting here"), &mut rng).respond)
            .count();
        assert!((2_500..3_500).contains(&hits), "got {} hits", hits);
    }

    #[test]
    fn test_mention_is_stripped() {
        let decision = evaluator(0.0).evaluate(&message("@BotName hey"), &mut rng());
        assert_eq!(decision.text, "hey");
    }

    #[test]
    fn test_two_char_remainder_uses_fallback_phrase() {
        let decision = evaluator(0.0).evaluate(&message("@BotName hi"), &mut rng());
        assert!(decision.respond);
        assert_eq!(decision.text, DEFAULT_FALLBACK_PHRASE);
    }

    #[test]
    fn test_mention_strip_ignores_case_and_keeps_other_text() {
        let decision = evaluator(0.0).evaluate(&message("Tell me, @BOTNAME, About Orks"), &mut rng());
        assert_eq!(decision.text, "Tell me, , About Orks");
    }

    #[test]
    fn test_bare_mention_uses_fallback_phrase() {
        let decision = evaluator(0.0).evaluate(&message("@BotName"), &mut rng());
        assert!(decision.respond);
        assert_eq!(decision.text, DEFAULT_FALLBACK_PHRASE);
    }

    #[test]
    fn test_mention_in_reply_appends_parent_text() {
        let decision =
            evaluator(0.0).evaluate(&reply("@BotName what about this", 7, "Orks are the best"), &mut rng());
        assert_eq!(decision.text, "what about this Orks are the best");
    }

    #[test]
    fn test_nameless_bot_is_never_mentioned() {
        let nameless = BotIdentity {
            id: BOT_ID,
            username: String::new(),
        };
        let evaluator = TriggerEvaluator::new(&nameless, 0.0, DEFAULT_FALLBACK_PHRASE).unwrap();
        let decision = evaluator.evaluate(&message("mail me @ home please"), &mut rng());
        assert!(!decision.respond);
    }

    #[test]
    fn test_mention_pattern_escapes_username() {
        let dotted = BotIdentity {
            id: BOT_ID,
            username: "war.bot".to_string(),
        };
        let evaluator = TriggerEvaluator::new(&dotted, 0.0, DEFAULT_FALLBACK_PHRASE).unwrap();
        assert!(!evaluator.evaluate(&message("hello @warXbot there"), &mut rng()).respond);
        let decision = evaluator.evaluate(&message("hello @War.Bot there"), &mut rng());
        assert_eq!(decision.text, "hello  there");
    }

    #[test]
    fn test_custom_fallback_phrase() {
        let evaluator = TriggerEvaluator::new(&bot(), 0.0, "speak, machine").unwrap();
        let decision = evaluator.evaluate(&message("  @botname  "), &mut rng());
        assert_eq!(decision.text, "speak, machine");
    }
}
