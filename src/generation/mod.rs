//! Text generation
//!
//! The relay treats the model as a black box: a prompt goes in, text or an
//! error comes out. `DeepSeekClient` speaks the OpenAI-compatible
//! chat-completion schema.

use eyre::Result;
use serde::{Deserialize, Serialize};

pub mod deepseek;

pub use deepseek::DeepSeekClient;

/// Produces a reply for a fully composed prompt
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationRequest {
    /// Single-turn request carrying the prompt as the user message
    pub fn user_prompt(model: &str, prompt: &str, max_tokens: u32, temperature: f64) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
}

impl GenerationResponse {
    /// Reduce the response to the first choice's trimmed text
    pub fn into_text(self) -> Result<String> {
        if let Some(error) = self.error
            && !error.message.is_empty()
        {
            eyre::bail!("API error: {}", error.message);
        }

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| eyre::eyre!("No choices in response"))?;

        let text = choice.message.content.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            eyre::bail!("Empty content in response");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> GenerationResponse {
        serde_json::from_str(body).expect("Failed to parse response")
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerationRequest::user_prompt("deepseek-chat", "hello", 150, 0.8);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "deepseek-chat",
                "messages": [{"role": "user", "content": "hello"}],
                "max_tokens": 150,
                "temperature": 0.8
            })
        );
    }

    #[test]
    fn test_first_choice_trimmed() {
        let response = parse(r#"{"choices":[{"message":{"content":"  Heresy!\n"}},{"message":{"content":"x"}}]}"#);
        assert_eq!(response.into_text().unwrap(), "Heresy!");
    }

    #[test]
    fn test_api_error_reported() {
        let response = parse(r#"{"error":{"message":"Insufficient Balance","type":"unknown_error"}}"#);
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("Insufficient Balance"));
    }

    #[test]
    fn test_no_choices_is_error() {
        assert!(parse(r#"{"choices":[]}"#).into_text().is_err());
        assert!(parse("{}").into_text().is_err());
    }

    #[test]
    fn test_blank_content_is_error() {
        assert!(parse(r#"{"choices":[{"message":{"content":"   "}}]}"#).into_text().is_err());
        assert!(parse(r#"{"choices":[{"message":{"content":null}}]}"#).into_text().is_err());
    }

    #[test]
    fn test_empty_error_message_ignored() {
        let response = parse(r#"{"choices":[{"message":{"content":"ok then"}}],"error":{"message":""}}"#);
        assert_eq!(response.into_text().unwrap(), "ok then");
    }
}
