//! Data model for the persisted purchase store.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::normalize::sanitize_order_id;

pub const CURRENCY: &str = "TWD";
pub const SOURCE: &str = "coupang";

/// One extracted order line, the unit of scraped data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Dedup key. Site-provided when available, content fingerprint otherwise.
    pub order_id: String,
    /// ISO `YYYY-MM-DD`, raw text if unparsed, empty if absent.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub category: String,
    /// Free-text delivery status; may change between scrapes of one order.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_link: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub scraped_at: String,
}

fn default_currency() -> String {
    CURRENCY.to_string()
}

fn default_quantity() -> u32 {
    1
}

fn default_source() -> String {
    SOURCE.to_string()
}

impl PurchaseRecord {
    /// Builds a record with defaults applied, a sanitized order id, and a
    /// fingerprint key synthesized when the page provided no id at all.
    pub fn new(order_id: &str, date: String, name: String, price: f64) -> Self {
        let cleaned = sanitize_order_id(order_id);
        let order_id = if cleaned.is_empty() {
            fingerprint_id(&name, &date, price)
        } else {
            cleaned
        };
        Self {
            order_id,
            date,
            name,
            price,
            currency: default_currency(),
            quantity: 1,
            category: String::new(),
            status: String::new(),
            image_url: String::new(),
            product_link: String::new(),
            source: default_source(),
            scraped_at: Utc::now().to_rfc3339(),
        }
    }

    /// The upsert key used by the ingestion path.
    pub fn content_key(&self) -> String {
        format!("{}|{}|{}", self.name, self.date, self.price)
    }
}

/// Deterministic fallback key derived from record content, so re-scraping
/// the same real-world order converges on one id across runs.
pub fn fingerprint_id(name: &str, date: &str, price: f64) -> String {
    let seed = format!("{}|{}|{}", name.trim(), date.trim(), price);
    format!("{}-{:016x}", SOURCE, fnv1a64(seed.as_bytes()))
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Aggregate metadata, recomputed on every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub last_updated: String,
    pub total_spent: f64,
    pub total_items: usize,
    pub currency: String,
    pub source: String,
}

impl Default for StoreMeta {
    fn default() -> Self {
        Self {
            last_updated: Utc::now().to_rfc3339(),
            total_spent: 0.0,
            total_items: 0,
            currency: CURRENCY.to_string(),
            source: "coupang-scraper".to_string(),
        }
    }
}

/// The persisted document: `{ meta, purchases }`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PurchaseStore {
    #[serde(default)]
    pub meta: StoreMeta,
    #[serde(default)]
    pub purchases: Vec<PurchaseRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let a = fingerprint_id("維他命C 1000mg", "2025-03-07", 599.0);
        let b = fingerprint_id("維他命C 1000mg", "2025-03-07", 599.0);
        assert_eq!(a, b);
        assert!(a.starts_with("coupang-"));
    }

    #[test]
    fn fingerprint_differs_on_content() {
        let a = fingerprint_id("咖啡豆", "2025-03-07", 599.0);
        let b = fingerprint_id("咖啡豆", "2025-03-08", 599.0);
        assert_ne!(a, b);
    }

    #[test]
    fn new_record_synthesizes_id_when_page_gave_none() {
        let rec = PurchaseRecord::new("", "2025-03-07".into(), "咖啡豆".into(), 250.0);
        assert_eq!(rec.order_id, fingerprint_id("咖啡豆", "2025-03-07", 250.0));
        assert_eq!(rec.quantity, 1);
        assert_eq!(rec.currency, CURRENCY);
    }

    #[test]
    fn new_record_sanitizes_site_id() {
        let rec = PurchaseRecord::new("訂單 #2024-11-0099", "".into(), "x".into(), 0.0);
        assert_eq!(rec.order_id, "2024-11-0099");
    }

    #[test]
    fn record_round_trips_as_camel_case() {
        let rec = PurchaseRecord::new("abc-123", "2025-01-02".into(), "毛巾".into(), 99.0);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("orderId").is_some());
        assert!(json.get("productLink").is_some());
        let back: PurchaseRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }
}
