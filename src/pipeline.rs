//! The per-message intake pipeline.
//!
//! One entry point per message kind; both always return the reply text
//! for the originating chat. Internal failures pick the reply per the
//! error taxonomy: no transcript stops the pipeline with a fixed
//! message, a failed ledger append stops it with another, and extraction
//! problems degrade to an unstructured record instead of failing.
//!
//! Messages are processed independently and statelessly; the only shared
//! state is the service handles themselves.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info};

use crate::adapters::{Ledger, SpeechToText};
use crate::domain::Entry;
use crate::extractor::FieldExtractor;

/// Reply when a voice message produced no transcript
pub const RECOGNITION_FAILED_REPLY: &str = "Не удалось распознать голосовое сообщение.";

/// Reply when the ledger append failed
pub const LEDGER_FAILED_REPLY: &str = "Ошибка при добавлении данных в таблицу.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The message-intake pipeline over injected service handles
pub struct Pipeline {
    transcriber: Arc<dyn SpeechToText>,
    extractor: FieldExtractor,
    ledger: Arc<dyn Ledger>,
    timezone: Tz,
}

impl Pipeline {
    /// Assemble a pipeline from its service handles
    pub fn new(
        transcriber: Arc<dyn SpeechToText>,
        extractor: FieldExtractor,
        ledger: Arc<dyn Ledger>,
        timezone: Tz,
    ) -> Self {
        Self {
            transcriber,
            extractor,
            ledger,
            timezone,
        }
    }

    /// Handle a voice message: transcribe, then continue as text.
    ///
    /// An empty result set and a failed recognize call both stop here;
    /// the extractor and the ledger are never reached.
    pub async fn process_voice(&self, audio: &[u8]) -> String {
        let transcript = match self.transcriber.transcribe(audio).await {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => {
                info!("Transcription returned no result");
                return RECOGNITION_FAILED_REPLY.to_string();
            }
            Err(e) => {
                error!("Transcription failed: {:#}", e);
                return RECOGNITION_FAILED_REPLY.to_string();
            }
        };

        self.process_text(&transcript).await
    }

    /// Handle a text message end to end
    pub async fn process_text(&self, text: &str) -> String {
        info!("Processing message: {}", text);

        let extraction = self.extractor.extract(text).await;
        let entry = Entry::new(format_timestamp(Utc::now(), &self.timezone), extraction);

        if let Err(e) = self.ledger.append(entry.to_row()).await {
            error!("Ledger append failed: {:#}", e);
            return LEDGER_FAILED_REPLY.to_string();
        }

        entry.confirmation()
    }
}

/// Render an instant as the ledger timestamp in the given timezone
fn format_timestamp(now: DateTime<Utc>, tz: &Tz) -> String {
    now.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}
