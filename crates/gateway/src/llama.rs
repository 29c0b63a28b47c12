//! Chat-completions client for backstory generation.
//!
//! Talks to the HuggingFace router's OpenAI-compatible endpoint with a
//! Meta Llama 3 instruct model.

use std::time::Duration;

use async_trait::async_trait;
use pixsynth_core::config::{env_duration_secs, env_string};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::types::TextGateway;

const PROVIDER: &str = "Story generation";

const SYSTEM_PROMPT: &str = "You are a creative writer who writes engaging character backstories.";

#[derive(Debug, Clone)]
pub struct LlamaConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://router.huggingface.co/v1/chat/completions".into(),
            model: "meta-llama/Meta-Llama-3-8B-Instruct".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl LlamaConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default                                              |
    /// |---------------------|------------------------------------------------------|
    /// | `HF_TOKEN`          | unset (story generation disabled)                    |
    /// | `LLAMA_API_URL`     | `https://router.huggingface.co/v1/chat/completions`  |
    /// | `LLAMA_MODEL`       | `meta-llama/Meta-Llama-3-8B-Instruct`                |
    /// | `LLAMA_TIMEOUT_SECS`| `30`                                                 |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
            api_url: env_string("LLAMA_API_URL", &defaults.api_url),
            model: env_string("LLAMA_MODEL", &defaults.model),
            timeout: env_duration_secs("LLAMA_TIMEOUT_SECS", defaults.timeout),
        }
    }
}

pub struct LlamaApi {
    client: reqwest::Client,
    config: LlamaConfig,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

impl LlamaApi {
    pub fn new(config: LlamaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.token.is_some()
    }
}

#[async_trait]
impl TextGateway for LlamaApi {
    async fn generate_text(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(GatewayError::NotConfigured(PROVIDER))?;

        let user_content = wrap_prompt(prompt);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(token)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::from_status(status.as_u16(), text));
        }

        let story = extract_reply(&text)?;
        tracing::info!(chars = story.chars().count(), "Generated story text");
        Ok(story)
    }
}

fn wrap_prompt(prompt: &str) -> String {
    format!(
        "Write a short backstory (about 100 words) for a character.\n\n{prompt}\n\n\
         Write a creative and engaging backstory:"
    )
}

fn extract_reply(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(format!("unexpected chat response: {e}")))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(GatewayError::Malformed("empty completion".into()));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn extracts_first_choice_trimmed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Once upon a time.\n"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "Once upon a time.");
    }

    #[test]
    fn empty_choices_are_malformed() {
        assert_matches!(extract_reply(r#"{"choices":[]}"#), Err(GatewayError::Malformed(_)));
        assert_matches!(
            extract_reply(r#"{"choices":[{"message":{"content":"   "}}]}"#),
            Err(GatewayError::Malformed(_))
        );
    }

    #[test]
    fn prompt_is_wrapped_for_the_model() {
        let wrapped = wrap_prompt("A ninja named Kage");
        assert!(wrapped.starts_with("Write a short backstory (about 100 words) for a character.\n\n"));
        assert!(wrapped.contains("\n\nA ninja named Kage\n\n"));
        assert!(wrapped.ends_with("Write a creative and engaging backstory:"));
    }

    #[tokio::test]
    async fn missing_token_is_not_configured() {
        let api = LlamaApi::new(LlamaConfig::default());
        assert!(!api.is_configured());
        assert_matches!(
            api.generate_text("p", 150, 0.7).await,
            Err(GatewayError::NotConfigured(_))
        );
    }
}
