//! The ledger entry and the extraction record it is built from.
//!
//! An `Entry` is constructed once per inbound message, rendered as one
//! spreadsheet row and one confirmation reply, and then discarded. Fields
//! the extractor could not find carry the `-` sentinel all the way into
//! the stored row.

use serde::Deserialize;

/// Marker for "field not present" in extracted data
pub const SENTINEL: &str = "-";

fn sentinel() -> String {
    SENTINEL.to_string()
}

/// The four fields the language model is asked to extract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractedFields {
    /// What was done (free text, may contain URLs and mixed scripts)
    #[serde(default = "sentinel")]
    pub description: String,

    /// Client or project display name
    #[serde(default = "sentinel")]
    pub client: String,

    /// Time spent, as the model reported it
    #[serde(default = "sentinel")]
    pub time_spent: String,

    /// Amount charged, as the model reported it
    #[serde(default = "sentinel")]
    pub amount: String,
}

/// Result of running the field extractor over one message.
///
/// The extractor never hard-fails: a reply that does not parse, or a model
/// call that errors out, degrades to `Unstructured` text that becomes the
/// description of the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The model reply parsed as the expected four-key JSON record
    Structured(ExtractedFields),

    /// Fallback: the raw model reply, or the raw user message when the
    /// call itself failed
    Unstructured(String),
}

impl Extraction {
    /// Collapse into plain fields, filling sentinels for the fallback case
    pub fn into_fields(self) -> ExtractedFields {
        match self {
            Self::Structured(fields) => fields,
            Self::Unstructured(text) => ExtractedFields {
                description: text,
                client: sentinel(),
                time_spent: sentinel(),
                amount: sentinel(),
            },
        }
    }
}

/// One timestamped record appended to the ledger
#[derive(Debug, Clone)]
pub struct Entry {
    /// Local date-time, already formatted for the fixed timezone
    pub timestamp: String,

    /// What was done
    pub description: String,

    /// Client display name
    pub client_name: String,

    /// Time spent (sentinel when absent)
    pub time_spent: String,

    /// Amount (sentinel when absent)
    pub amount: String,
}

impl Entry {
    /// Build an entry from a formatted timestamp and an extraction result
    pub fn new(timestamp: String, extraction: Extraction) -> Self {
        let fields = extraction.into_fields();
        Self {
            timestamp,
            description: fields.description,
            client_name: fields.client,
            time_spent: fields.time_spent,
            amount: fields.amount,
        }
    }

    /// The five ordered cells appended to the spreadsheet
    pub fn to_row(&self) -> [String; 5] {
        [
            self.timestamp.clone(),
            self.description.clone(),
            self.client_name.clone(),
            self.time_spent.clone(),
            self.amount.clone(),
        ]
    }

    /// The confirmation reply sent back to the chat.
    ///
    /// Timestamp, description and client always appear; time and amount
    /// lines only when the field carries real data.
    pub fn confirmation(&self) -> String {
        let mut reply = format!(
            "📆 {}\n💬 {}\n🧑‍💼 {}",
            self.timestamp, self.description, self.client_name
        );

        if has_value(&self.time_spent) {
            reply.push_str(&format!("\n🕝 {}", self.time_spent));
        }
        if has_value(&self.amount) {
            reply.push_str(&format!("\n💰 {}", self.amount));
        }

        reply
    }
}

/// A field makes it into the reply only when it is neither the sentinel
/// nor blank after trimming
fn has_value(value: &str) -> bool {
    value != SENTINEL && !value.trim().is_empty()
}
