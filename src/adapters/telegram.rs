//! Telegram Bot API adapter.
//!
//! Thin reqwest client over the Bot API methods the intake loop needs:
//! long-polled updates, voice-file download, and replies.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Telegram Bot API client
pub struct TelegramClient {
    /// Bot token
    bot_token: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response envelope from the Bot API
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One update from getUpdates
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// An inbound chat message (text or voice attachment)
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<Voice>,
}

/// The chat a message arrived from
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Voice attachment metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
    #[serde(default)]
    pub duration: u32,
}

/// Result of getMe
#[derive(Debug, Deserialize)]
pub struct BotInfo {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Result of getFile
#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Message result from sendMessage
#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    /// Build file-download URL
    fn file_url(&self, file_path: &str) -> String {
        format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token, file_path
        )
    }

    /// Unwrap the API envelope, turning `ok: false` into an error
    fn unwrap_response<T>(result: TelegramResponse<T>, method: &str) -> Result<T> {
        if !result.ok {
            anyhow::bail!(
                "Telegram API error in {}: {}",
                method,
                result.description.unwrap_or_default()
            );
        }

        result
            .result
            .with_context(|| format!("Telegram {} returned no result", method))
    }

    /// Identify the bot (used as a health check)
    pub async fn get_me(&self) -> Result<BotInfo> {
        let response = self
            .client
            .post(self.api_url("getMe"))
            .send()
            .await
            .context("Failed to call Telegram getMe")?;

        let result: TelegramResponse<BotInfo> = response
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        Self::unwrap_response(result, "getMe")
    }

    /// Long-poll for updates after `offset`.
    ///
    /// The HTTP timeout sits above the server-side hold so the request is
    /// never cut short by the client.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }))
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await
            .context("Failed to poll Telegram updates")?;

        let result: TelegramResponse<Vec<Update>> = response
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        Self::unwrap_response(result, "getUpdates")
    }

    /// Download a voice attachment into memory
    pub async fn download_voice(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.api_url("getFile"))
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await
            .context("Failed to call Telegram getFile")?;

        let result: TelegramResponse<FileInfo> = response
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        let info = Self::unwrap_response(result, "getFile")?;
        let file_path = info
            .file_path
            .context("Telegram getFile returned no file_path")?;

        let bytes = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .context("Failed to download voice file")?
            .error_for_status()
            .context("Voice file download rejected")?
            .bytes()
            .await
            .context("Failed to read voice file body")?;

        Ok(bytes.to_vec())
    }

    /// Send a text message to a chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await
            .context("Failed to send Telegram message")?;

        let result: TelegramResponse<MessageResult> = response
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        Self::unwrap_response(result, "sendMessage").map(|r| r.message_id)
    }
}
