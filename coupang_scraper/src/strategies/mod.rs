//! Order extraction strategies.
//!
//! Structured DOM selectors are the primary path; free-text block parsing
//! is the fallback when the page's class names have rotated again. Embedded
//! JSON always runs as a supplement, and passive network interception
//! collects in the background for the whole run.

use std::future::Future;

use chromiumoxide::Page;
use purchase_store::normalize::{normalize_date, parse_price};
use purchase_store::{categorize, PurchaseRecord};
use serde_json::Value;

pub mod dom;
pub mod embedded;
pub mod network;
pub mod text;

/// Extracts records from the currently rendered page: structured DOM with
/// a free-text fallback, plus whatever embedded JSON yields.
pub async fn extract_page(page: &Page, base_url: &str) -> Vec<PurchaseRecord> {
    let structured = dom::extract(page, base_url).await;
    let mut records = select_primary(structured, move || async move {
        let blocks = text::harvest_blocks(page).await;
        text::extract_from_blocks(&blocks)
    })
    .await;
    records.extend(embedded::extract(page).await);
    records
}

/// The fallback runs only when the primary strategy produced nothing.
pub async fn select_primary<F, Fut>(primary: Vec<PurchaseRecord>, fallback: F) -> Vec<PurchaseRecord>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Vec<PurchaseRecord>>,
{
    if primary.is_empty() {
        tracing::debug!("structured extraction came up empty, trying free-text blocks");
        fallback().await
    } else {
        tracing::debug!("structured extraction yielded {} records", primary.len());
        primary
    }
}

/// Builds a record from a JSON order object, tolerating the field-name
/// drift seen across the site's API revisions.
pub(crate) fn record_from_value(value: &Value) -> Option<PurchaseRecord> {
    let obj = value.as_object()?;

    let order_id = string_alias(value, &["orderId", "orderNumber", "orderNo", "id"])
        .unwrap_or_default();
    let name = string_alias(value, &["productName", "name", "itemName", "title"])
        .or_else(|| string_alias(first_item(value)?, &["productName", "name", "itemName"]))
        .unwrap_or_default();
    if order_id.is_empty() && name.is_empty() {
        return None;
    }

    let price = price_alias(
        value,
        &["totalPrice", "price", "amount", "paymentAmount", "totalAmount"],
    )
    .or_else(|| price_alias(first_item(value)?, &["price", "totalPrice"]))
    .unwrap_or(0.0);

    let date = string_alias(value, &["orderDate", "createdAt", "orderedAt", "date"])
        .map(|d| normalize_date(&d))
        .unwrap_or_default();

    let mut rec = PurchaseRecord::new(&order_id, date, name, price);
    if let Some(q) = obj
        .get("quantity")
        .or_else(|| obj.get("qty"))
        .and_then(Value::as_u64)
    {
        rec.quantity = (q.max(1)) as u32;
    }
    if let Some(status) = string_alias(value, &["status", "orderStatus", "deliveryStatus"]) {
        rec.status = status;
    }
    if let Some(img) = string_alias(value, &["imageUrl", "image", "thumbnailUrl"]) {
        rec.image_url = img;
    }
    rec.category = categorize(&rec.name).to_string();
    Some(rec)
}

fn first_item(value: &Value) -> Option<&Value> {
    value
        .get("items")
        .or_else(|| value.get("orderItems"))
        .and_then(Value::as_array)
        .and_then(|a| a.first())
}

/// First non-empty string (or number rendered as string) among the keys.
fn string_alias(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Price fields arrive as numbers or as formatted strings ("NT$1,234").
fn price_alias(value: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match value.get(key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(parse_price(s)),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(name: &str) -> PurchaseRecord {
        PurchaseRecord::new("", "2025-03-07".into(), name.into(), 100.0)
    }

    #[tokio::test]
    async fn fallback_is_not_invoked_when_structured_yields() {
        let structured = vec![rec("a"), rec("b"), rec("c")];
        let out = select_primary(structured, || async { panic!("fallback ran") }).await;
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn fallback_runs_on_empty_primary() {
        let out = select_primary(Vec::new(), || async { vec![rec("from-text")] }).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "from-text");
    }

    #[test]
    fn record_from_value_follows_alias_chain() {
        let value = json!({
            "orderNumber": "TW-2025-0042",
            "productName": "衛生紙 24入",
            "totalPrice": "NT$1,299",
            "orderDate": "2025.3.7",
            "qty": 2,
            "deliveryStatus": "配送中"
        });
        let rec = record_from_value(&value).unwrap();
        assert_eq!(rec.order_id, "TW-2025-0042");
        assert_eq!(rec.name, "衛生紙 24入");
        assert_eq!(rec.price, 1299.0);
        assert_eq!(rec.date, "2025-03-07");
        assert_eq!(rec.quantity, 2);
        assert_eq!(rec.status, "配送中");
    }

    #[test]
    fn record_from_value_pulls_name_from_first_item() {
        let value = json!({
            "orderId": "A1",
            "items": [{"name": "咖啡豆 1kg", "price": 450}]
        });
        let rec = record_from_value(&value).unwrap();
        assert_eq!(rec.name, "咖啡豆 1kg");
        assert_eq!(rec.price, 450.0);
    }

    #[test]
    fn record_from_value_rejects_contentless_objects() {
        assert!(record_from_value(&json!({"foo": "bar"})).is_none());
        assert!(record_from_value(&json!(42)).is_none());
    }
}
