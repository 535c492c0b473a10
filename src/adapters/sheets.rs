//! Google Sheets ledger adapter.
//!
//! Appends one row per processed message via the `values.append`
//! endpoint. Nothing is ever read back; the spreadsheet's own
//! concurrency control handles simultaneous writers.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Ledger, TokenProvider};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Sheets REST client for the target spreadsheet
pub struct SheetsClient {
    /// Spreadsheet ID
    spreadsheet_id: String,
    /// Range the append call targets
    range: String,
    /// Shared access-token source
    tokens: Arc<TokenProvider>,
    /// HTTP client
    client: reqwest::Client,
}

impl SheetsClient {
    /// Create a new Sheets client
    pub fn new(spreadsheet_id: String, range: String, tokens: Arc<TokenProvider>) -> Self {
        Self {
            spreadsheet_id,
            range,
            tokens,
            client: reqwest::Client::new(),
        }
    }

    fn append_url(&self) -> String {
        format!(
            "{}/{}/values/{}:append",
            SHEETS_BASE_URL, self.spreadsheet_id, self.range
        )
    }

    fn append_body(row: [String; 5]) -> serde_json::Value {
        serde_json::json!({ "values": [row] })
    }

    /// Fetch spreadsheet metadata (used as a health check)
    pub async fn probe(&self) -> Result<()> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(format!("{}/{}", SHEETS_BASE_URL, self.spreadsheet_id))
            .query(&[("fields", "spreadsheetId")])
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to reach Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheets API error ({}): {}", status, text);
        }

        Ok(())
    }
}

#[async_trait]
impl Ledger for SheetsClient {
    async fn append(&self, row: [String; 5]) -> Result<()> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(self.append_url())
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&Self::append_body(row))
            .send()
            .await
            .context("Failed to call Sheets append")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheets append error ({}): {}", status, text);
        }

        Ok(())
    }
}
