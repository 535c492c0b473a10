//! Command-line interface for ledgerbot.
//!
//! Provides commands for running the intake loop, health-checking the
//! external services, and inspecting the resolved configuration.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::adapters::{OpenAiClient, SheetsClient, TelegramClient, TokenProvider};
use crate::bot::IntakeBot;
use crate::config::Settings;

/// ledgerbot - Telegram work-intake bot backed by a Google Sheet
#[derive(Parser, Debug)]
#[command(name = "ledgerbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the intake loop (long polling)
    Run,

    /// Health-check the external services
    Check,

    /// Show resolved configuration (secrets redacted)
    Config,
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run => execute_run().await,
            Commands::Check => execute_check().await,
            Commands::Config => execute_config(),
        }
    }
}

/// Run the bot until Ctrl+C
async fn execute_run() -> Result<()> {
    let settings = Settings::from_env()?;
    let bot = IntakeBot::from_settings(&settings);
    bot.run().await
}

/// Probe each external service and report per-service status
async fn execute_check() -> Result<()> {
    let settings = Settings::from_env()?;
    let mut failures = 0usize;

    println!();
    println!("Service health");
    println!("══════════════════════════════════════════════════════════════");
    println!();

    let telegram = TelegramClient::new(settings.bot_token.clone());
    match telegram.get_me().await {
        Ok(me) => println!(
            "  ✓ Telegram:    @{}",
            me.username.unwrap_or_else(|| me.id.to_string())
        ),
        Err(e) => {
            println!("  ❌ Telegram:    {:#}", e);
            failures += 1;
        }
    }

    let model = OpenAiClient::new(settings.openai_api_key.clone(), settings.model.clone());
    match model.probe().await {
        Ok(()) => println!("  ✓ OpenAI:      {} reachable", settings.model),
        Err(e) => {
            println!("  ❌ OpenAI:      {:#}", e);
            failures += 1;
        }
    }

    let tokens = Arc::new(TokenProvider::new(settings.google_key.clone()));
    match tokens.access_token().await {
        // One token covers both Google services (Sheets + Speech)
        Ok(_) => println!("  ✓ Google auth: token issued"),
        Err(e) => {
            println!("  ❌ Google auth: {:#}", e);
            failures += 1;
        }
    }

    let sheets = SheetsClient::new(
        settings.spreadsheet_id.clone(),
        settings.sheet_range.clone(),
        tokens,
    );
    match sheets.probe().await {
        Ok(()) => println!("  ✓ Sheets:      spreadsheet reachable"),
        Err(e) => {
            println!("  ❌ Sheets:      {:#}", e);
            failures += 1;
        }
    }

    println!();

    if failures > 0 {
        anyhow::bail!("{} service check(s) failed", failures);
    }

    println!("✅ All services healthy");
    Ok(())
}

/// Print the resolved non-secret configuration
fn execute_config() -> Result<()> {
    let settings = Settings::from_env()?;

    println!();
    println!("Resolved configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("Model:           {}", settings.model);
    println!("Language:        {}", settings.language_code);
    println!("Timezone:        {}", settings.timezone.name());
    println!("Spreadsheet:     {}", settings.spreadsheet_id);
    println!("Sheet range:     {}", settings.sheet_range);
    println!("Service account: {}", settings.google_key.client_email);
    println!();

    Ok(())
}
