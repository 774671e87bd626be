//! Credential scrubbing for log output
//!
//! Telegram puts the bot token in every request path, so transport errors
//! that echo the URL would otherwise leak it into the log file.

use lazy_regex::regex;

pub fn redact(text: &str) -> String {
    let text = regex!(r"bot\d+:[A-Za-z0-9_-]+").replace_all(text, "bot<redacted>");
    regex!(r"bearer\s+\S+"i)
        .replace_all(&text, "Bearer <redacted>")
        .into_owned()
}
