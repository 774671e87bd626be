use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "WHBOT_";

/// Log level for the relay log file
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Main relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub deepseek_api_url: String,
    pub deepseek_api_key: String,
    /// Chance that an unaddressed message still gets a reply
    pub trigger_probability: f64,
    /// Only this chat is served; 0 accepts every chat
    pub chat_id: i64,
    pub deepseek_model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Capacity of both history buffers
    pub store_updates: usize,
    pub request_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub poll_backoff_secs: u64,
    pub log_level: LogLevel,
    /// Persona instructions, one is picked per reply
    pub prompts: Vec<String>,
    /// Substituted when a mention carries almost no text
    pub fallback_phrase: String,
    /// Canned replies used when generation fails
    pub fallback_responses: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            deepseek_api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            deepseek_api_key: String::new(),
            trigger_probability: 0.1,
            chat_id: 0,
            deepseek_model: "deepseek-chat".to_string(),
            max_tokens: 150,
            temperature: 0.8,
            store_updates: 20,
            request_timeout_secs: 30,
            poll_timeout_secs: 60,
            poll_backoff_secs: 3,
            log_level: LogLevel::default(),
            prompts: crate::relay::persona::default_prompts(),
            fallback_phrase: crate::relay::trigger::DEFAULT_FALLBACK_PHRASE.to_string(),
            fallback_responses: default_fallback_responses(),
        }
    }
}

pub fn default_fallback_responses() -> Vec<String> {
    vec![
        "My astropathic powers have weakened...".to_string(),
        "Warp storms are disrupting the link!".to_string(),
        "The tech-priests are checking the link with the machine spirit...".to_string(),
    ]
}

impl Config {
    /// Load configuration with fallback chain, then apply `WHBOT_*` overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            let path = Self::expand_path(path);
            return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check WHBOT_CONFIG env var
        if let Ok(env_path) = std::env::var("WHBOT_CONFIG") {
            let path = Self::expand_path(Path::new(&env_path));
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from WHBOT_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try ~/.config/whbot/config.yaml
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("whbot").join("config.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./config.yaml (for development)
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Override scalar keys from `WHBOT_<KEY>` variables
    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(&format!("{}{}", ENV_PREFIX, key.to_uppercase()));

        if let Some(v) = var("telegram_token") {
            self.telegram_token = v;
        }
        if let Some(v) = var("telegram_api_url") {
            self.telegram_api_url = v;
        }
        if let Some(v) = var("deepseek_api_url") {
            self.deepseek_api_url = v;
        }
        if let Some(v) = var("deepseek_api_key") {
            self.deepseek_api_key = v;
        }
        if let Some(v) = var("deepseek_model") {
            self.deepseek_model = v;
        }
        if let Some(v) = var("trigger_probability") {
            self.trigger_probability = v.parse().context("Invalid WHBOT_TRIGGER_PROBABILITY")?;
        }
        if let Some(v) = var("chat_id") {
            self.chat_id = v.parse().context("Invalid WHBOT_CHAT_ID")?;
        }
        if let Some(v) = var("max_tokens") {
            self.max_tokens = v.parse().context("Invalid WHBOT_MAX_TOKENS")?;
        }
        if let Some(v) = var("temperature") {
            self.temperature = v.parse().context("Invalid WHBOT_TEMPERATURE")?;
        }
        if let Some(v) = var("store_updates") {
            self.store_updates = v.parse().context("Invalid WHBOT_STORE_UPDATES")?;
        }
        if let Some(v) = var("request_timeout_secs") {
            self.request_timeout_secs = v.parse().context("Invalid WHBOT_REQUEST_TIMEOUT_SECS")?;
        }
        if let Some(v) = var("poll_timeout_secs") {
            self.poll_timeout_secs = v.parse().context("Invalid WHBOT_POLL_TIMEOUT_SECS")?;
        }
        if let Some(v) = var("poll_backoff_secs") {
            self.poll_backoff_secs = v.parse().context("Invalid WHBOT_POLL_BACKOFF_SECS")?;
        }
        if let Some(v) = var("fallback_phrase") {
            self.fallback_phrase = v;
        }
        if let Some(v) = var("log_level") {
            self.log_level = LogLevel::parse(&v).ok_or_else(|| eyre::eyre!("Invalid WHBOT_LOG_LEVEL: {}", v))?;
        }

        Ok(())
    }

    /// Reject configurations the relay cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.trim().is_empty() {
            eyre::bail!("telegram_token is required");
        }
        if self.deepseek_api_key.trim().is_empty() {
            eyre::bail!("deepseek_api_key is required");
        }
        if self.prompts.is_empty() {
            eyre::bail!("prompts can't be empty");
        }
        if self.fallback_responses.is_empty() {
            eyre::bail!("fallback_responses can't be empty");
        }
        if !(0.0..=1.0).contains(&self.trigger_probability) {
            eyre::bail!(
                "trigger_probability must be between 0 and 1, got {}",
                self.trigger_probability
            );
        }
        if self.store_updates == 0 {
            eyre::bail!("store_updates must be at least 1");
        }
        Ok(())
    }

    /// Copy safe to print: credentials are masked
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        config.telegram_token = mask(&config.telegram_token);
        config.deepseek_api_key = mask(&config.deepseek_api_key);
        config
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let tail: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}
