use colored::*;
use eyre::{Context, Result};
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::generation::{DeepSeekClient, Generator};
use crate::redact::redact;
use crate::relay::orchestrator::RelaySettings;
use crate::relay::persona::Clock;
use crate::relay::{Orchestrator, Outcome, PersonaCatalog};
use crate::transport::{ChatTransport, TelegramTransport};

pub fn run(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let catalog = PersonaCatalog::new(config.prompts.clone())?;
    let mut transport = TelegramTransport::from_config(config);
    let bot = transport.identity().context("Failed to authorize with Telegram")?;

    log::info!("Authorized on account {}", bot.username);
    eprintln!("{} Authorized on account {}", "✓".green(), bot.username.cyan());

    let generator = DeepSeekClient::from_config(config);
    let mut orchestrator = Orchestrator::new(bot, RelaySettings::from_config(config), catalog, generator)?;

    log::info!(
        "Relaying chat {} with history capacity {}",
        if config.chat_id == 0 { "any".to_string() } else { config.chat_id.to_string() },
        orchestrator.history().capacity()
    );

    let backoff = Duration::from_secs(config.poll_backoff_secs);
    loop {
        if let Err(e) = pump(&mut transport, &mut orchestrator) {
            log::error!("Polling failed: {}", redact(&format!("{:#}", e)));
            thread::sleep(backoff);
        }
    }
}

/// Fetch one batch of messages and run each through the orchestrator in order
pub fn pump<T, G, C>(transport: &mut T, orchestrator: &mut Orchestrator<G, C>) -> Result<Vec<Outcome>>
where
    T: ChatTransport,
    G: Generator,
    C: Clock,
{
    let messages = transport.poll()?;
    let outcomes = messages
        .iter()
        .map(|message| orchestrator.handle(message, &*transport))
        .collect();
    Ok(outcomes)
}
