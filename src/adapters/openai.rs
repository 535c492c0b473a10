//! OpenAI chat-completions adapter.
//!
//! One non-streaming call per message with temperature pinned to zero so
//! extraction output stays deterministic.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::ChatModel;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODELS_URL: &str = "https://api.openai.com/v1/models";

/// OpenAI API client
pub struct OpenAiClient {
    /// API key
    api_key: String,
    /// Model used for completions
    model: String,
    /// HTTP client
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, system: &str, user: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": 0,
        })
    }

    /// List-models call used as a health check
    pub async fn probe(&self) -> Result<()> {
        let response = self
            .client
            .get(MODELS_URL)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Failed to reach OpenAI API")?;

        if !response.status().is_success() {
            anyhow::bail!("OpenAI API error: {}", response.status());
        }

        Ok(())
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system, user))
            .send()
            .await
            .context("Failed to call chat completions")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, text);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Chat completion returned no choices")
    }
}
