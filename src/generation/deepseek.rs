use eyre::{Context, Result};
use std::time::Duration;
use ureq::Agent;

use super::{GenerationRequest, GenerationResponse, Generator};
use crate::config::Config;

/// Client for DeepSeek (or any OpenAI-compatible) chat completions
pub struct DeepSeekClient {
    agent: Agent,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl DeepSeekClient {
    pub fn new(url: &str, api_key: &str, model: &str, max_tokens: u32, temperature: f64, timeout: Duration) -> Self {
        // Non-2xx bodies still carry an error message worth reading
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.deepseek_api_url,
            &config.deepseek_api_key,
            &config.deepseek_model,
            config.max_tokens,
            config.temperature,
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

impl Generator for DeepSeekClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest::user_prompt(&self.model, prompt, self.max_tokens, self.temperature);
        let request_body = serde_json::to_string(&request).context("Failed to serialize request")?;

        log::debug!("Calling {} with model {}", self.url, self.model);

        let mut response = self
            .agent
            .post(&self.url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(request_body.as_bytes())
            .context("Failed to call generation API")?;

        let status = response.status();
        let response_body = response
            .body_mut()
            .read_to_string()
            .context("Failed to read response")?;

        let parsed = serde_json::from_str::<GenerationResponse>(&response_body);

        if !status.is_success() {
            let detail = parsed
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| truncate(&response_body, 200));
            eyre::bail!("Generation API returned {}: {}", status.as_u16(), detail);
        }

        parsed.context("Failed to parse generation response")?.into_text()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
