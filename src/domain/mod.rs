//! Domain types for ledgerbot.
//!
//! One entity: the ledger `Entry`, built from an `Extraction` once per
//! inbound message and appended to the spreadsheet as a single row.

pub mod entry;

// Re-export commonly used types
pub use entry::{Entry, ExtractedFields, Extraction, SENTINEL};
