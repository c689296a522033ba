//! Passive network interception.
//!
//! The order page hydrates itself over XHR; watching those responses is
//! often the cleanest source of order data. A collector is attached before
//! navigation starts, accumulates in the background for the whole run, and
//! is drained exactly once after pagination finishes.

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use purchase_store::PurchaseRecord;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::ScrapeError;

use super::record_from_value;

pub struct NetworkCollector {
    task: tokio::task::JoinHandle<()>,
    rx: mpsc::UnboundedReceiver<PurchaseRecord>,
}

impl NetworkCollector {
    /// Enables network events on the page and spawns the listener.
    pub async fn attach(page: &Page) -> Result<Self, ScrapeError> {
        page.execute(EnableParams::default()).await?;
        let mut events = page.event_listener::<EventResponseReceived>().await?;
        let page = page.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let response = &event.response;
                if !is_order_response(&response.url, response.status, &response.mime_type) {
                    continue;
                }
                let params = GetResponseBodyParams::new(event.request_id.clone());
                let body = match page.execute(params).await {
                    Ok(resp) => resp.result,
                    // Bodies evicted from the network cache are gone; move on.
                    Err(err) => {
                        tracing::debug!("response body unavailable for {}: {err}", response.url);
                        continue;
                    }
                };
                if body.base64_encoded {
                    continue;
                }
                let Ok(value) = serde_json::from_str::<Value>(&body.body) else {
                    continue;
                };
                let records = extract_from_api(&value);
                if !records.is_empty() {
                    tracing::debug!("{} records intercepted from {}", records.len(), response.url);
                }
                for rec in records {
                    if tx.send(rec).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Self { task, rx })
    }

    /// Stops listening and returns everything accumulated so far.
    pub fn drain(mut self) -> Vec<PurchaseRecord> {
        self.task.abort();
        let mut records = Vec::new();
        while let Ok(rec) = self.rx.try_recv() {
            records.push(rec);
        }
        records
    }
}

/// A successful JSON response on an order-ish endpoint. Path segments
/// only; a stray `order` in a query string does not qualify.
pub fn is_order_response(url: &str, status: i64, mime_type: &str) -> bool {
    if status != 200 || !mime_type.contains("json") {
        return false;
    }
    url.contains("/api/") || url.contains("/order") || url.contains("/purchase")
}

/// Finds the order array inside whatever envelope this API revision uses,
/// then maps each element through the shared alias chain.
pub fn extract_from_api(value: &Value) -> Vec<PurchaseRecord> {
    const ARRAY_PATHS: &[&str] = &[
        "/data/orders",
        "/orders",
        "/data/orderList",
        "/orderList",
        "/result/orders",
        "/data/items",
        "/items",
    ];

    let array = if value.is_array() {
        Some(value)
    } else {
        ARRAY_PATHS
            .iter()
            .find_map(|p| value.pointer(p).filter(|v| v.is_array()))
    };

    array
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(record_from_value).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_filter_matches_order_endpoints() {
        assert!(is_order_response(
            "https://mc.tw.coupang.com/api/v1/order/list?page=1",
            200,
            "application/json;charset=UTF-8"
        ));
        assert!(!is_order_response(
            "https://mc.tw.coupang.com/api/v1/order/list",
            403,
            "application/json"
        ));
        assert!(!is_order_response(
            "https://img.tw.coupang.com/banner.png",
            200,
            "image/png"
        ));
        assert!(!is_order_response(
            "https://www.tw.coupang.com/order/list",
            200,
            "text/html"
        ));
        // "order" in a query string is not an order endpoint.
        assert!(!is_order_response(
            "https://www.tw.coupang.com/search?sort=order",
            200,
            "application/json"
        ));
        assert!(is_order_response(
            "https://mc.tw.coupang.com/purchase/history",
            200,
            "application/json"
        ));
    }

    #[test]
    fn envelope_paths_are_tried_in_order() {
        let nested = json!({"data": {"orders": [{"orderId": "N1", "productName": "雨傘", "totalPrice": 199}]}});
        assert_eq!(extract_from_api(&nested).len(), 1);

        let flat = json!({"orderList": [{"orderNo": "N2", "name": "水壺", "price": "NT$350"}]});
        let records = extract_from_api(&flat);
        assert_eq!(records[0].order_id, "N2");
        assert_eq!(records[0].price, 350.0);
    }

    #[test]
    fn bare_arrays_are_accepted() {
        let value = json!([{"orderId": "B1", "name": "延長線", "price": 299}]);
        assert_eq!(extract_from_api(&value).len(), 1);
    }

    #[test]
    fn unrecognized_envelopes_yield_nothing() {
        assert!(extract_from_api(&json!({"status": "ok"})).is_empty());
        assert!(extract_from_api(&json!("just a string")).is_empty());
    }
}
