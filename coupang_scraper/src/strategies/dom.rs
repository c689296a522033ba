//! Structured extraction from the rendered order list.

use chromiumoxide::{Element, Page};
use purchase_store::normalize::{normalize_date, parse_price, parse_quantity};
use purchase_store::{categorize, PurchaseRecord};

use crate::selectors;

/// Extracts one record per order container. An empty result means the
/// page's structure is unrecognized, not that there are no orders; the
/// caller decides whether to fall back.
pub async fn extract(page: &Page, base_url: &str) -> Vec<PurchaseRecord> {
    let Some(items) = order_groups(page).await else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for item in &items {
        match extract_item(item, base_url).await {
            Some(rec) => records.push(rec),
            // One broken card should not sink the page.
            None => tracing::debug!("skipping order container with no recognizable fields"),
        }
    }
    records
}

async fn order_groups(page: &Page) -> Option<Vec<Element>> {
    for sel in selectors::ORDER_ITEM {
        if let Ok(els) = page.find_elements(*sel).await {
            if !els.is_empty() {
                tracing::debug!("{} order containers via {sel}", els.len());
                return Some(els);
            }
        }
    }
    None
}

async fn extract_item(item: &Element, base_url: &str) -> Option<PurchaseRecord> {
    let raw = RawItem {
        order_id: first_text(item, selectors::ORDER_ID).await,
        date: first_text(item, selectors::ORDER_DATE).await,
        name: first_text(item, selectors::PRODUCT_NAME).await,
        price: first_text(item, selectors::PRODUCT_PRICE).await,
        quantity: first_text(item, selectors::QUANTITY).await,
        status: first_text(item, selectors::ORDER_STATUS).await,
        image_url: first_attr(item, selectors::PRODUCT_IMAGE, "src").await,
        product_link: first_attr(item, selectors::PRODUCT_LINK, "href").await,
    };
    raw.into_record(base_url)
}

/// Sub-field texts as the candidate lists resolved them, `None` where no
/// candidate matched.
#[derive(Debug, Default)]
struct RawItem {
    order_id: Option<String>,
    date: Option<String>,
    name: Option<String>,
    price: Option<String>,
    quantity: Option<String>,
    status: Option<String>,
    image_url: Option<String>,
    product_link: Option<String>,
}

impl RawItem {
    /// Unmatched sub-fields resolve to their defaults; even a nameless
    /// record is kept (the content fingerprint still gives it a distinct
    /// id). Only a container where no identifying field matched at all is
    /// dropped.
    fn into_record(self, base_url: &str) -> Option<PurchaseRecord> {
        if self.order_id.is_none() && self.name.is_none() && self.date.is_none()
            && self.price.is_none()
        {
            return None;
        }

        let order_id = self.order_id.unwrap_or_default();
        let date = self.date.map(|t| normalize_date(&t)).unwrap_or_default();
        let name = self.name.unwrap_or_default();
        let price = self.price.map(|t| parse_price(&t)).unwrap_or(0.0);

        let mut rec = PurchaseRecord::new(&order_id, date, name, price);
        if let Some(qty) = self.quantity {
            rec.quantity = parse_quantity(&qty);
        }
        if let Some(status) = self.status {
            rec.status = status;
        }
        if let Some(src) = self.image_url {
            rec.image_url = src;
        }
        if let Some(href) = self.product_link {
            rec.product_link = absolutize(base_url, &href);
        }
        rec.category = categorize(&rec.name).to_string();
        Some(rec)
    }
}

/// First non-empty inner text among the candidate child selectors.
async fn first_text(item: &Element, candidates: &[&str]) -> Option<String> {
    for sel in candidates {
        if let Ok(child) = item.find_element(*sel).await {
            if let Ok(Some(text)) = child.inner_text().await {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

async fn first_attr(item: &Element, candidates: &[&str], attr: &str) -> Option<String> {
    for sel in candidates {
        if let Ok(child) = item.find_element(*sel).await {
            if let Ok(Some(value)) = child.attribute(attr).await {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_are_joined_to_the_base() {
        assert_eq!(
            absolutize("https://www.tw.coupang.com", "/products/123"),
            "https://www.tw.coupang.com/products/123"
        );
        assert_eq!(
            absolutize("https://www.tw.coupang.com/", "/products/123"),
            "https://www.tw.coupang.com/products/123"
        );
    }

    #[test]
    fn absolute_links_pass_through() {
        let url = "https://img.tw.coupang.com/p/1.jpg";
        assert_eq!(absolutize("https://www.tw.coupang.com", url), url);
    }

    #[test]
    fn nameless_container_still_yields_a_record() {
        // A rotated name class must not sink a card whose other fields hit.
        let raw = RawItem {
            date: Some("2025.3.7 訂購".into()),
            price: Some("NT$599".into()),
            status: Some("配送中".into()),
            ..RawItem::default()
        };
        let rec = raw.into_record("https://www.tw.coupang.com").unwrap();
        assert_eq!(rec.name, "");
        assert_eq!(rec.date, "2025-03-07");
        assert_eq!(rec.price, 599.0);
        assert_eq!(rec.status, "配送中");
        assert!(rec.order_id.starts_with("coupang-"));
    }

    #[test]
    fn container_with_no_identifying_fields_is_dropped() {
        let raw = RawItem {
            status: Some("已完成".into()),
            ..RawItem::default()
        };
        assert!(raw.into_record("https://www.tw.coupang.com").is_none());
    }

    #[test]
    fn full_container_resolves_every_field() {
        let raw = RawItem {
            order_id: Some("訂單 #TW-77".into()),
            date: Some("2024/12/01".into()),
            name: Some("除濕機 12公升".into()),
            price: Some("NT$8,990".into()),
            quantity: Some("2 件".into()),
            status: Some("已送達".into()),
            image_url: Some("https://img.tw.coupang.com/p/1.jpg".into()),
            product_link: Some("/products/123".into()),
        };
        let rec = raw.into_record("https://www.tw.coupang.com").unwrap();
        assert_eq!(rec.order_id, "TW-77");
        assert_eq!(rec.quantity, 2);
        assert_eq!(rec.product_link, "https://www.tw.coupang.com/products/123");
    }
}
