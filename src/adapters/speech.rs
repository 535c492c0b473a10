//! Google Cloud Speech-to-Text adapter.
//!
//! One synchronous `speech:recognize` call per voice message: OGG_OPUS at
//! 48 kHz (the Telegram voice format), fixed language, audio bytes
//! base64-inlined in the request body. No chunking, no streaming.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use super::{SpeechToText, TokenProvider};

const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Telegram voice notes are Opus at 48 kHz
const SAMPLE_RATE_HERTZ: u32 = 48_000;

/// Speech-to-Text REST client
pub struct SpeechClient {
    /// Spoken language of the recordings
    language_code: String,
    /// Shared access-token source
    tokens: Arc<TokenProvider>,
    /// HTTP client
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl SpeechClient {
    /// Create a new Speech client
    pub fn new(language_code: String, tokens: Arc<TokenProvider>) -> Self {
        Self {
            language_code,
            tokens,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, audio: &[u8]) -> serde_json::Value {
        serde_json::json!({
            "config": {
                "encoding": "OGG_OPUS",
                "sampleRateHertz": SAMPLE_RATE_HERTZ,
                "languageCode": self.language_code,
            },
            "audio": {
                "content": STANDARD.encode(audio),
            },
        })
    }

    /// Best transcript: first alternative of the first result
    fn first_transcript(response: RecognizeResponse) -> Option<String> {
        response
            .results
            .into_iter()
            .next()
            .and_then(|result| result.alternatives.into_iter().next())
            .map(|alternative| alternative.transcript)
    }
}

#[async_trait]
impl SpeechToText for SpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(RECOGNIZE_URL)
            .bearer_auth(token)
            .json(&self.request_body(audio))
            .send()
            .await
            .context("Failed to call Speech recognize")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Speech API error ({}): {}", status, text);
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .context("Failed to parse Speech response")?;

        Ok(Self::first_transcript(parsed))
    }
}
