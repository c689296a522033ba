//! Extraction from JSON embedded in the page's script tags.
//!
//! Order pages sometimes ship their state inline: `ld+json` structured
//! data, hydration payloads, or small JSON fragments assigned to globals.
//! All of it is fair game and runs as a supplement to whichever rendered
//! strategy won.

use purchase_store::PurchaseRecord;
use regex::Regex;
use serde_json::Value;

use super::record_from_value;

/// Script text harvest, bounded in count and per-script size.
const SCRIPT_HARVEST_JS: &str = r#"
Array.from(document.querySelectorAll('script'))
  .map(s => s.textContent || '')
  .filter(t => t.length > 0 && t.length < 500000)
  .slice(0, 500)
"#;

pub async fn extract(page: &chromiumoxide::Page) -> Vec<PurchaseRecord> {
    let scripts = page
        .evaluate(SCRIPT_HARVEST_JS)
        .await
        .ok()
        .and_then(|v| v.into_value::<Vec<String>>().ok())
        .unwrap_or_default();
    scan_scripts(&scripts)
}

/// Scans script bodies two ways: whole-text JSON documents first, then
/// order-shaped `{...}` fragments fished out of larger code. Anything that
/// fails to parse is skipped silently; this path is opportunistic.
pub fn scan_scripts(scripts: &[String]) -> Vec<PurchaseRecord> {
    let fragment = Regex::new(r#"(?i)\{[^{}]*"order[^{}]*\}"#).expect("fragment pattern");
    let mut records = Vec::new();

    for script in scripts {
        let trimmed = script.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                collect_orders(&value, 0, &mut records);
                continue;
            }
        }
        for m in fragment.find_iter(script) {
            if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
                if let Some(rec) = record_from_value(&value) {
                    records.push(rec);
                }
            }
        }
    }
    records
}

/// Walks a parsed document looking for order-shaped objects, to a shallow
/// depth so hydration blobs stay cheap to scan.
fn collect_orders(value: &Value, depth: usize, out: &mut Vec<PurchaseRecord>) {
    if depth > 4 {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_orders(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            if looks_like_order(map) {
                if let Some(rec) = record_from_value(value) {
                    out.push(rec);
                    return;
                }
            }
            for child in map.values() {
                collect_orders(child, depth + 1, out);
            }
        }
        _ => {}
    }
}

fn looks_like_order(map: &serde_json::Map<String, Value>) -> bool {
    if map.get("@type").and_then(Value::as_str) == Some("Order") {
        return true;
    }
    ["orderId", "orderNumber", "orderNo"]
        .iter()
        .any(|k| map.contains_key(*k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ld_json_order_is_picked_up() {
        let scripts = vec![
            r#"{"@context":"https://schema.org","@type":"Order","orderNumber":"TW-99","orderDate":"2025-03-07","price":599}"#
                .to_string(),
        ];
        let records = scan_scripts(&scripts);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_id, "TW-99");
        assert_eq!(records[0].date, "2025-03-07");
    }

    #[test]
    fn hydration_payload_orders_are_found_nested() {
        let scripts = vec![
            r#"{"props":{"pageData":{"orders":[{"orderId":"A1","productName":"洗衣精","totalPrice":299},{"orderId":"A2","productName":"牙膏","totalPrice":99}]}}}"#
                .to_string(),
        ];
        let records = scan_scripts(&scripts);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_id, "A1");
        assert_eq!(records[1].name, "牙膏");
    }

    #[test]
    fn order_fragments_are_fished_out_of_code() {
        let scripts = vec![
            r#"window.__STATE__ = merge(cache, {"orderId":"B7","name":"電池 4入","price":159}); doThings();"#
                .to_string(),
        ];
        let records = scan_scripts(&scripts);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_id, "B7");
        assert_eq!(records[0].price, 159.0);
    }

    #[test]
    fn malformed_fragments_are_skipped_silently() {
        let scripts = vec![
            r#"var x = {"orderId": broken json here};"#.to_string(),
            "function notJsonAtAll() { return 1; }".to_string(),
        ];
        assert!(scan_scripts(&scripts).is_empty());
    }
}
