//! The `ingest` subcommand: applies a raw JSON batch to the store.
//!
//! The batch comes from the browser-console export flow, so fields are
//! loosely typed: prices may be formatted strings, dates unpadded, ids
//! missing. Everything goes through the same normalization the scraper
//! uses before the upsert.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use purchase_store::normalize::{normalize_date, parse_price};
use purchase_store::{PurchaseRecord, PurchaseStore};
use serde_json::Value;

#[derive(Args)]
pub struct IngestArgs {
    /// JSON file holding an array of exported order objects
    pub file: PathBuf,

    /// Store file to reconcile into
    #[arg(long, default_value = "purchases.json")]
    pub output: PathBuf,
}

pub fn run(args: &IngestArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.file.display()))?;
    let Some(items) = value.as_array() else {
        bail!("{} must contain a JSON array of orders", args.file.display());
    };

    let records: Vec<PurchaseRecord> = items.iter().filter_map(record_from_raw).collect();
    if records.is_empty() {
        bail!("no usable order objects in {}", args.file.display());
    }
    let dropped = items.len() - records.len();
    if dropped > 0 {
        tracing::warn!("{dropped} objects had no usable name and were dropped");
    }

    let mut store = PurchaseStore::load(&args.output);
    let outcome = store.reconcile(records);
    store.save(&args.output)?;

    println!(
        "{} added, {} updated, {} skipped; store holds {} purchases",
        outcome.added, outcome.updated, outcome.skipped, store.meta.total_items
    );
    Ok(())
}

/// Maps one loose export object onto a record. A name is the only hard
/// requirement; an absent id falls back to the content fingerprint.
fn record_from_raw(value: &Value) -> Option<PurchaseRecord> {
    let name = non_empty_str(value, "name")?;
    let order_id = non_empty_str(value, "orderId").unwrap_or_default();
    let date = non_empty_str(value, "date")
        .map(|d| normalize_date(&d))
        .unwrap_or_default();
    let price = match value.get("price") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_price(s),
        _ => 0.0,
    };

    let mut rec = PurchaseRecord::new(&order_id, date, name, price);
    if let Some(q) = value.get("quantity").and_then(Value::as_u64) {
        rec.quantity = (q.max(1)) as u32;
    }
    if let Some(status) = non_empty_str(value, "status") {
        rec.status = status;
    }
    if let Some(img) = non_empty_str(value, "imageUrl") {
        rec.image_url = img;
    }
    if let Some(link) = non_empty_str(value, "productLink") {
        rec.product_link = link;
    }
    Some(rec)
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_export_object_is_normalized() {
        let value = json!({
            "orderId": "訂單 #TW-2024-001",
            "name": "洗碗精補充包",
            "date": "2025.3.7",
            "price": "NT$129",
            "quantity": 3,
            "status": "已完成"
        });
        let rec = record_from_raw(&value).unwrap();
        assert_eq!(rec.order_id, "TW-2024-001");
        assert_eq!(rec.date, "2025-03-07");
        assert_eq!(rec.price, 129.0);
        assert_eq!(rec.quantity, 3);
        assert_eq!(rec.status, "已完成");
    }

    #[test]
    fn missing_id_falls_back_to_fingerprint() {
        let value = json!({"name": "牙線 50m", "date": "2025-01-01", "price": 59});
        let rec = record_from_raw(&value).unwrap();
        assert!(rec.order_id.starts_with("coupang-"));
        assert_eq!(rec.price, 59.0);
    }

    #[test]
    fn nameless_objects_are_rejected() {
        assert!(record_from_raw(&json!({"orderId": "X", "price": 100})).is_none());
        assert!(record_from_raw(&json!({"name": "   "})).is_none());
    }
}
