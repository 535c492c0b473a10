//! Adapter interfaces for external services.
//!
//! Each remote collaborator the pipeline calls sits behind a small trait
//! so tests can substitute fakes: speech-to-text, the chat model, and the
//! ledger. The Telegram transport stays concrete; the polling loop
//! drives it directly.

pub mod google;
pub mod openai;
pub mod sheets;
pub mod speech;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

// Re-export the concrete clients
pub use google::TokenProvider;
pub use openai::OpenAiClient;
pub use sheets::SheetsClient;
pub use speech::SpeechClient;
pub use telegram::TelegramClient;

/// Speech-to-text over one voice recording
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Best transcript of the recording, or `None` when the service
    /// returns no results
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>>;
}

/// One-shot chat-model completion
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a system + user instruction pair, return the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Append-only tabular store
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append one row of five ordered cells
    async fn append(&self, row: [String; 5]) -> Result<()>;
}
