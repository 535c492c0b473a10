//! Long-polling intake loop.
//!
//! Wires the service handles from settings, polls Telegram for updates,
//! and hands each message to the pipeline in its own task. Handler
//! errors are logged centrally; the loop itself never stops on them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::adapters::telegram::Message;
use crate::adapters::{
    OpenAiClient, SheetsClient, SpeechClient, TelegramClient, TokenProvider,
};
use crate::config::Settings;
use crate::extractor::FieldExtractor;
use crate::pipeline::Pipeline;

/// Long-poll hold time in seconds
const POLL_TIMEOUT_SECS: u64 = 50;

/// Pause before re-polling after a failed getUpdates call
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// The assembled bot: transport plus pipeline
pub struct IntakeBot {
    telegram: Arc<TelegramClient>,
    pipeline: Arc<Pipeline>,
}

impl IntakeBot {
    /// Wire up all service handles from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let tokens = Arc::new(TokenProvider::new(settings.google_key.clone()));

        let transcriber = Arc::new(SpeechClient::new(
            settings.language_code.clone(),
            tokens.clone(),
        ));
        let model = Arc::new(OpenAiClient::new(
            settings.openai_api_key.clone(),
            settings.model.clone(),
        ));
        let ledger = Arc::new(SheetsClient::new(
            settings.spreadsheet_id.clone(),
            settings.sheet_range.clone(),
            tokens,
        ));

        let pipeline = Pipeline::new(
            transcriber,
            FieldExtractor::new(model),
            ledger,
            settings.timezone,
        );

        Self {
            telegram: Arc::new(TelegramClient::new(settings.bot_token.clone())),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Poll for updates until Ctrl+C
    pub async fn run(&self) -> Result<()> {
        let me = self
            .telegram
            .get_me()
            .await
            .context("Telegram getMe failed, check TELEGRAM_BOT_TOKEN")?;
        info!(
            "Polling as @{}",
            me.username.as_deref().unwrap_or("unknown")
        );

        let mut shutdown = Box::pin(tokio::signal::ctrl_c());
        let mut offset = 0i64;

        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping intake loop");
                    return Ok(());
                }
                polled = self.telegram.get_updates(offset, POLL_TIMEOUT_SECS) => polled,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Update poll failed: {:#}", e);
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);

                let Some(message) = update.message else {
                    continue;
                };

                let telegram = self.telegram.clone();
                let pipeline = self.pipeline.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_message(&telegram, &pipeline, message).await {
                        // Central catch: log and keep polling
                        error!("Error while handling an update: {:#}", e);
                    }
                });
            }
        }
    }
}

/// Handle one inbound message and send the reply.
///
/// Commands like `/start` arrive as plain text and take the same path.
async fn handle_message(
    telegram: &TelegramClient,
    pipeline: &Pipeline,
    message: Message,
) -> Result<()> {
    let chat_id = message.chat.id;

    let reply = if let Some(voice) = message.voice {
        let audio = telegram.download_voice(&voice.file_id).await?;
        pipeline.process_voice(&audio).await
    } else if let Some(text) = message.text {
        pipeline.process_text(&text).await
    } else {
        // Stickers, photos and the like are outside the intake contract
        return Ok(());
    };

    telegram.send_message(chat_id, &reply).await?;
    Ok(())
}
