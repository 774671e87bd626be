use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "whbot",
    about = "Group-chat relay that answers in character through a chat-completion API",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/whbot/logs/whbot.log\n\nEvery config key can be overridden with WHBOT_<KEY>, e.g. WHBOT_TELEGRAM_TOKEN."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config.yaml")]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(short, long, global = true, help = "Log to stderr instead of the log file")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the chat and start relaying
    Run,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect the persona catalog
    Persona {
        #[command(subcommand)]
        action: PersonaAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (credentials masked)
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a single configuration value
    Get {
        /// Config key (e.g. trigger_probability)
        key: String,
    },
}

#[derive(Subcommand)]
pub enum PersonaAction {
    /// List the configured personas
    List,

    /// Show which personas the day seed picks
    Pick {
        /// UTC date to seed from (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,

        /// Number of consecutive picks to show
        #[arg(long, short = 'n', default_value_t = 1)]
        draws: usize,
    },
}
