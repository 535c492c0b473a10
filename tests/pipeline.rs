//! Intake Pipeline Integration Tests
//!
//! Exercises the pipeline end to end over fake service handles: a
//! scripted transcriber, a scripted chat model, and a recording ledger.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono_tz::Tz;

use ledgerbot::adapters::{ChatModel, Ledger, SpeechToText};
use ledgerbot::extractor::FieldExtractor;
use ledgerbot::pipeline::{Pipeline, LEDGER_FAILED_REPLY, RECOGNITION_FAILED_REPLY};
use ledgerbot::SENTINEL;

/// Shared observation point for the fakes
#[derive(Default)]
struct Recorder {
    model_calls: Mutex<u32>,
    rows: Mutex<Vec<[String; 5]>>,
}

impl Recorder {
    fn model_calls(&self) -> u32 {
        *self.model_calls.lock().unwrap()
    }

    fn rows(&self) -> Vec<[String; 5]> {
        self.rows.lock().unwrap().clone()
    }
}

/// Transcriber that returns a scripted transcript
struct FakeTranscriber(Option<String>);

#[async_trait]
impl SpeechToText for FakeTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Transcriber whose call always fails
struct FailingTranscriber;

#[async_trait]
impl SpeechToText for FailingTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<Option<String>> {
        anyhow::bail!("audio decode error")
    }
}

/// Model that counts calls and returns a canned reply
struct FakeModel {
    reply: String,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        *self.recorder.model_calls.lock().unwrap() += 1;
        Ok(self.reply.clone())
    }
}

/// Model whose call always fails
struct FailingModel {
    recorder: Arc<Recorder>,
}

#[async_trait]
impl ChatModel for FailingModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        *self.recorder.model_calls.lock().unwrap() += 1;
        anyhow::bail!("invalid api key")
    }
}

/// Ledger that records appended rows
struct RecordingLedger {
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Ledger for RecordingLedger {
    async fn append(&self, row: [String; 5]) -> Result<()> {
        self.recorder.rows.lock().unwrap().push(row);
        Ok(())
    }
}

/// Ledger whose append always fails
struct FailingLedger;

#[async_trait]
impl Ledger for FailingLedger {
    async fn append(&self, _row: [String; 5]) -> Result<()> {
        anyhow::bail!("permission denied")
    }
}

const GOOD_MODEL_REPLY: &str =
    r#"{"description":"написал лендинг","client":"Иван","time_spent":"2 часа","amount":"500"}"#;

fn build_pipeline(
    transcriber: Arc<dyn SpeechToText>,
    model: Arc<dyn ChatModel>,
    ledger: Arc<dyn Ledger>,
) -> Pipeline {
    let tz: Tz = "Europe/Kiev".parse().unwrap();
    Pipeline::new(transcriber, FieldExtractor::new(model), ledger, tz)
}

fn assert_looks_like_timestamp(cell: &str) {
    // %Y-%m-%d %H:%M:%S
    assert_eq!(cell.len(), 19, "unexpected timestamp shape: {}", cell);
    assert_eq!(&cell[4..5], "-");
    assert_eq!(&cell[10..11], " ");
    assert_eq!(&cell[13..14], ":");
}

#[tokio::test]
async fn test_structured_message_appends_row_and_replies() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = build_pipeline(
        Arc::new(FakeTranscriber(None)),
        Arc::new(FakeModel {
            reply: GOOD_MODEL_REPLY.to_string(),
            recorder: recorder.clone(),
        }),
        Arc::new(RecordingLedger {
            recorder: recorder.clone(),
        }),
    );

    let reply = pipeline
        .process_text("Иван, написал лендинг, 2 часа, 500 грн")
        .await;

    // All four tagged lines in the confirmation
    assert!(reply.contains("📆 "));
    assert!(reply.contains("💬 написал лендинг"));
    assert!(reply.contains("🧑‍💼 Иван"));
    assert!(reply.contains("🕝 2 часа"));
    assert!(reply.contains("💰 500"));

    // Exactly one row of five ordered cells
    let rows = recorder.rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_looks_like_timestamp(&row[0]);
    assert_eq!(row[1], "написал лендинг");
    assert_eq!(row[2], "Иван");
    assert_eq!(row[3], "2 часа");
    assert_eq!(row[4], "500");
}

#[tokio::test]
async fn test_prose_model_reply_degrades_to_unstructured() {
    let recorder = Arc::new(Recorder::default());
    let prose = "Это сообщение не содержит данных о работе.";
    let pipeline = build_pipeline(
        Arc::new(FakeTranscriber(None)),
        Arc::new(FakeModel {
            reply: prose.to_string(),
            recorder: recorder.clone(),
        }),
        Arc::new(RecordingLedger {
            recorder: recorder.clone(),
        }),
    );

    let reply = pipeline.process_text("привет").await;

    // Only timestamp/description/client lines
    assert!(reply.contains(&format!("💬 {}", prose)));
    assert!(reply.contains(&format!("🧑‍💼 {}", SENTINEL)));
    assert!(!reply.contains("🕝"));
    assert!(!reply.contains("💰"));

    // Sentinels still land in the row
    let rows = recorder.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], prose);
    assert_eq!(rows[0][2], SENTINEL);
    assert_eq!(rows[0][3], SENTINEL);
    assert_eq!(rows[0][4], SENTINEL);
}

#[tokio::test]
async fn test_model_failure_keeps_raw_message() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = build_pipeline(
        Arc::new(FakeTranscriber(None)),
        Arc::new(FailingModel {
            recorder: recorder.clone(),
        }),
        Arc::new(RecordingLedger {
            recorder: recorder.clone(),
        }),
    );

    let reply = pipeline.process_text("Иван, правки на сайте").await;

    // The unprocessed message becomes the description
    assert!(reply.contains("💬 Иван, правки на сайте"));
    let rows = recorder.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "Иван, правки на сайте");
    assert_eq!(rows[0][2], SENTINEL);
}

#[tokio::test]
async fn test_voice_message_flows_like_text() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = build_pipeline(
        Arc::new(FakeTranscriber(Some(
            "Иван, написал лендинг, 2 часа, 500 грн".to_string(),
        ))),
        Arc::new(FakeModel {
            reply: GOOD_MODEL_REPLY.to_string(),
            recorder: recorder.clone(),
        }),
        Arc::new(RecordingLedger {
            recorder: recorder.clone(),
        }),
    );

    let reply = pipeline.process_voice(b"opus bytes").await;

    assert!(reply.contains("💬 написал лендинг"));
    assert!(reply.contains("💰 500"));
    assert_eq!(recorder.rows().len(), 1);
}

#[tokio::test]
async fn test_empty_transcription_stops_pipeline() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = build_pipeline(
        Arc::new(FakeTranscriber(None)),
        Arc::new(FakeModel {
            reply: GOOD_MODEL_REPLY.to_string(),
            recorder: recorder.clone(),
        }),
        Arc::new(RecordingLedger {
            recorder: recorder.clone(),
        }),
    );

    let reply = pipeline.process_voice(b"opus bytes").await;

    assert_eq!(reply, RECOGNITION_FAILED_REPLY);
    // Neither the extractor nor the ledger was reached
    assert_eq!(recorder.model_calls(), 0);
    assert!(recorder.rows().is_empty());
}

#[tokio::test]
async fn test_failed_transcription_stops_pipeline() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = build_pipeline(
        Arc::new(FailingTranscriber),
        Arc::new(FakeModel {
            reply: GOOD_MODEL_REPLY.to_string(),
            recorder: recorder.clone(),
        }),
        Arc::new(RecordingLedger {
            recorder: recorder.clone(),
        }),
    );

    let reply = pipeline.process_voice(b"opus bytes").await;

    assert_eq!(reply, RECOGNITION_FAILED_REPLY);
    assert_eq!(recorder.model_calls(), 0);
    assert!(recorder.rows().is_empty());
}

#[tokio::test]
async fn test_ledger_failure_reports_fixed_error() {
    let recorder = Arc::new(Recorder::default());
    let pipeline = build_pipeline(
        Arc::new(FakeTranscriber(None)),
        Arc::new(FakeModel {
            reply: GOOD_MODEL_REPLY.to_string(),
            recorder: recorder.clone(),
        }),
        Arc::new(FailingLedger),
    );

    let reply = pipeline.process_text("Иван, написал лендинг").await;

    assert_eq!(reply, LEDGER_FAILED_REPLY);
}
