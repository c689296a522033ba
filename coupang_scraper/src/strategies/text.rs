//! Free-text fallback extraction.
//!
//! When the structured selectors no longer match anything, small text
//! blocks are harvested from the page and pattern-matched for the fields
//! an order line always carries: a date, a price, and a product name.

use purchase_store::normalize::{normalize_date, parse_price};
use purchase_store::{categorize, PurchaseRecord};
use regex::Regex;

/// Harvests candidate text blocks: small leaf-ish containers, bounded in
/// size and count so a pathological page cannot flood the parser.
const BLOCK_HARVEST_JS: &str = r#"
Array.from(document.querySelectorAll('div, li, section, article'))
  .filter(el => {
    const t = (el.innerText || '').trim();
    return t.length >= 20 && t.length <= 1000 && el.querySelectorAll('*').length <= 30;
  })
  .map(el => el.innerText.trim())
  .slice(0, 200)
"#;

pub async fn harvest_blocks(page: &chromiumoxide::Page) -> Vec<String> {
    page.evaluate(BLOCK_HARVEST_JS)
        .await
        .ok()
        .and_then(|v| v.into_value::<Vec<String>>().ok())
        .unwrap_or_default()
}

pub fn extract_from_blocks(blocks: &[String]) -> Vec<PurchaseRecord> {
    let patterns = Patterns::new();
    let mut records = Vec::new();
    for block in blocks {
        if let Some(rec) = parse_block(block, &patterns) {
            records.push(rec);
        }
    }
    tracing::debug!("{} records from {} text blocks", records.len(), blocks.len());
    records
}

struct Patterns {
    date: Regex,
    price: Regex,
    quantity: Regex,
    status: Regex,
    action_line: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            date: Regex::new(r"(\d{4})\s*[./\-]\s*(\d{1,2})\s*[./\-]\s*(\d{1,2})")
                .expect("date pattern"),
            price: Regex::new(r"(?:NT\$|TWD|＄|\$)\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
                .expect("price pattern"),
            quantity: Regex::new(r"(\d+)\s*件").expect("quantity pattern"),
            status: Regex::new(r"配送中|已完成|配送完成|已送達|已取消|處理中|退貨|退款|準備中")
                .expect("status pattern"),
            action_line: Regex::new(r"^(查看|加入購物車|再次購買|追蹤|評價)").expect("action pattern"),
        }
    }
}

/// A block qualifies as an order line only when a date and a price are both
/// present and a plausible name line can be found.
fn parse_block(block: &str, patterns: &Patterns) -> Option<PurchaseRecord> {
    // Same canonicalization every strategy uses; out-of-range component
    // combinations stay raw instead of becoming fake ISO dates.
    let date = patterns
        .date
        .find(block)
        .map(|m| normalize_date(m.as_str()))?;
    let price = patterns
        .price
        .captures(block)
        .map(|c| parse_price(&c[1]))?;
    let name = name_line(block, patterns)?;

    let mut rec = PurchaseRecord::new("", date, name, price);
    if let Some(c) = patterns.quantity.captures(block) {
        rec.quantity = c[1].parse::<u32>().unwrap_or(1).max(1);
    }
    if let Some(m) = patterns.status.find(block) {
        rec.status = m.as_str().to_string();
    }
    rec.category = categorize(&rec.name).to_string();
    Some(rec)
}

/// The product name is the first line that is not a date, a price, a
/// quantity, a status word, or a call-to-action label.
fn name_line(block: &str, patterns: &Patterns) -> Option<String> {
    block
        .lines()
        .map(str::trim)
        .find(|line| {
            line.chars().count() > 5
                && !patterns.date.is_match(line)
                && !patterns.price.is_match(line)
                && !patterns.quantity.is_match(line)
                && !patterns.status.is_match(line)
                && !patterns.action_line.is_match(line)
                && !line.chars().all(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_typical_order_block() {
        let blocks = vec![
            "2025.3.7 訂購\n維他命C 1000mg 100錠\nNT$599\n2件\n配送中\n查看訂單詳情".to_string(),
        ];
        let records = extract_from_blocks(&blocks);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.date, "2025-03-07");
        assert_eq!(rec.name, "維他命C 1000mg 100錠");
        assert_eq!(rec.price, 599.0);
        assert_eq!(rec.quantity, 2);
        assert_eq!(rec.status, "配送中");
        assert!(rec.order_id.starts_with("coupang-"));
    }

    #[test]
    fn blocks_without_a_price_are_skipped() {
        let blocks = vec!["2025.3.7\n某個沒有價格的商品名稱".to_string()];
        assert!(extract_from_blocks(&blocks).is_empty());
    }

    #[test]
    fn blocks_without_a_date_are_skipped() {
        let blocks = vec!["某個商品名稱\nNT$1,234".to_string()];
        assert!(extract_from_blocks(&blocks).is_empty());
    }

    #[test]
    fn name_skips_metadata_and_action_lines() {
        let block = "2025-03-07\nNT$250\n已送達\n查看訂單詳情\n精品咖啡豆 中焙 454g";
        let patterns = Patterns::new();
        assert_eq!(
            name_line(block, &patterns).as_deref(),
            Some("精品咖啡豆 中焙 454g")
        );
    }

    #[test]
    fn out_of_range_date_text_stays_raw() {
        let blocks = vec!["2025.99.99\n看起來像訂單的商品名稱\nNT$100".to_string()];
        let records = extract_from_blocks(&blocks);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "2025.99.99");
    }

    #[test]
    fn comma_separated_prices_parse() {
        let blocks = vec!["2025/12/24 訂購\n除濕機 12公升 一級能效\nNT$ 8,990\n已完成".to_string()];
        let records = extract_from_blocks(&blocks);
        assert_eq!(records[0].price, 8990.0);
        assert_eq!(records[0].date, "2025-12-24");
        assert_eq!(records[0].status, "已完成");
    }
}
