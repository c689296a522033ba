//! The `push` subcommand: sends a batch to the companion ingestion server.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use coupang_scraper::PushClient;
use purchase_store::{PurchaseRecord, PurchaseStore};
use serde_json::Value;

#[derive(Args)]
pub struct PushArgs {
    /// Store file or raw array of records to send
    pub file: PathBuf,

    /// Base URL of the ingestion server
    #[arg(long, default_value = "http://localhost:3333")]
    pub server: String,
}

pub async fn run(args: &PushArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let records = records_from_file(&raw)
        .with_context(|| format!("parsing {}", args.file.display()))?;
    if records.is_empty() {
        bail!("{} holds no records", args.file.display());
    }

    let client = PushClient::new(&args.server)?;
    let outcome = client.push(&records).await?;
    println!(
        "server accepted the batch: {} added, {} updated, {} total",
        outcome.added, outcome.updated, outcome.total
    );
    Ok(())
}

/// Accepts either a full store document or a bare array of records.
fn records_from_file(raw: &str) -> Result<Vec<PurchaseRecord>> {
    let value: Value = serde_json::from_str(raw)?;
    if value.is_array() {
        return Ok(serde_json::from_value(value)?);
    }
    let store: PurchaseStore = serde_json::from_value(value)?;
    Ok(store.purchases)
}
