use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    let config = config.masked();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&config)?);
        }
        OutputFormat::Text => {
            println!("{}", "whbot configuration".bold());
            println!();

            println!("{}:", "telegram".cyan());
            println!("  token: {}", display_secret(&config.telegram_token));
            println!("  api_url: {}", config.telegram_api_url);
            println!("  chat_id: {}", display_chat(config.chat_id));
            println!();

            println!("{}:", "generation".cyan());
            println!("  api_url: {}", config.deepseek_api_url);
            println!("  api_key: {}", display_secret(&config.deepseek_api_key));
            println!("  model: {}", config.deepseek_model);
            println!("  max_tokens: {}", config.max_tokens);
            println!("  temperature: {}", config.temperature);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!();

            println!("{}:", "relay".cyan());
            println!("  trigger_probability: {}", config.trigger_probability);
            println!("  store_updates: {}", config.store_updates);
            println!("  personas: {}", config.prompts.len());
            println!("  fallback_responses: {}", config.fallback_responses.len());
            println!("  log_level: {}", config.log_level.as_filter());
        }
    }

    Ok(())
}

fn display_secret(masked: &str) -> ColoredString {
    if masked.is_empty() {
        "(not set)".red()
    } else {
        masked.normal()
    }
}

fn display_chat(chat_id: i64) -> String {
    if chat_id == 0 {
        "any".to_string()
    } else {
        chat_id.to_string()
    }
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    let config = config.masked();
    let value = match key.replace('-', "_").as_str() {
        "telegram_token" => config.telegram_token,
        "telegram_api_url" => config.telegram_api_url,
        "deepseek_api_url" => config.deepseek_api_url,
        "deepseek_api_key" => config.deepseek_api_key,
        "deepseek_model" => config.deepseek_model,
        "trigger_probability" => config.trigger_probability.to_string(),
        "chat_id" => config.chat_id.to_string(),
        "max_tokens" => config.max_tokens.to_string(),
        "temperature" => config.temperature.to_string(),
        "store_updates" => config.store_updates.to_string(),
        "request_timeout_secs" => config.request_timeout_secs.to_string(),
        "poll_timeout_secs" => config.poll_timeout_secs.to_string(),
        "poll_backoff_secs" => config.poll_backoff_secs.to_string(),
        "log_level" => config.log_level.as_filter().to_string(),
        "fallback_phrase" => config.fallback_phrase,
        _ => return None,
    };
    Some(value)
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => eyre::bail!("Unknown config key: {}", key),
    }
    Ok(())
}
