//! ledgerbot - Telegram work-intake bot
//!
//! Receives text or voice messages from a Telegram chat, extracts a
//! structured work record via a chat-model call, appends the record as
//! one row to a Google Sheet, and replies with a formatted confirmation.
//!
//! # Architecture
//!
//! A single stateless pipeline per message:
//!
//! ```text
//! Telegram long poll → (voice) Speech-to-Text → Field Extractor →
//! Sheets append → reply
//! ```
//!
//! - Extraction is parse-or-fallback: output that is not the expected
//!   JSON degrades to an unstructured record, never a hard failure
//! - No retries, no cross-message state; each update runs in its own task
//!
//! # Modules
//!
//! - `adapters`: External service integrations (Telegram, OpenAI,
//!   Google Speech, Google Sheets) and the traits the pipeline sees
//! - `domain`: The ledger `Entry` and extraction record
//! - `extractor`: Prompting and parse-or-fallback decoding
//! - `pipeline`: Per-message control flow and error taxonomy
//! - `bot`: Long-polling loop and service wiring
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Start the bot
//! ledgerbot run
//!
//! # Verify credentials and connectivity
//! ledgerbot check
//! ```

pub mod adapters;
pub mod bot;
pub mod cli;
pub mod config;
pub mod domain;
pub mod extractor;
pub mod pipeline;

// Re-export main types at crate root for convenience
pub use adapters::{ChatModel, Ledger, SpeechToText};
pub use bot::IntakeBot;
pub use config::Settings;
pub use domain::{Entry, ExtractedFields, Extraction, SENTINEL};
pub use extractor::FieldExtractor;
pub use pipeline::Pipeline;
