//! The `stats` subcommand: per-category counts and spend.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use purchase_store::PurchaseStore;
use tabled::{Table, Tabled};

#[derive(Args)]
pub struct StatsArgs {
    /// Store file to summarize
    #[arg(long, default_value = "purchases.json")]
    pub output: PathBuf,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Orders")]
    orders: usize,
    #[tabled(rename = "Spend (NT$)")]
    spend: String,
}

pub fn run(args: &StatsArgs) -> Result<()> {
    let store = PurchaseStore::load(&args.output);
    if store.purchases.is_empty() {
        println!("store {} is empty", args.output.display());
        return Ok(());
    }

    let rows = category_rows(&store);
    println!("{}", Table::new(rows));
    println!(
        "{} purchases, NT${:.0} total, last updated {}",
        store.purchases.len(),
        store.purchases.iter().map(|p| p.price).sum::<f64>(),
        store.meta.last_updated
    );
    Ok(())
}

fn category_rows(store: &PurchaseStore) -> Vec<CategoryRow> {
    let mut buckets: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for rec in &store.purchases {
        let category = if rec.category.is_empty() {
            "其他"
        } else {
            rec.category.as_str()
        };
        let entry = buckets.entry(category).or_default();
        entry.0 += 1;
        entry.1 += rec.price;
    }

    let mut rows: Vec<CategoryRow> = buckets
        .into_iter()
        .map(|(category, (orders, spend))| CategoryRow {
            category: category.to_string(),
            orders,
            spend: format!("{spend:.0}"),
        })
        .collect();
    rows.sort_by(|a, b| b.orders.cmp(&a.orders));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use purchase_store::PurchaseRecord;

    #[test]
    fn rows_group_by_category_and_sort_by_count() {
        let mut store = PurchaseStore::default();
        for (name, cat, price) in [
            ("a", "食品", 100.0),
            ("b", "食品", 200.0),
            ("c", "居家", 50.0),
            ("d", "", 10.0),
        ] {
            let mut rec = PurchaseRecord::new("", "2025-01-01".into(), name.into(), price);
            rec.category = cat.to_string();
            store.purchases.push(rec);
        }

        let rows = category_rows(&store);
        assert_eq!(rows[0].category, "食品");
        assert_eq!(rows[0].orders, 2);
        assert_eq!(rows[0].spend, "300");
        assert!(rows.iter().any(|r| r.category == "其他" && r.orders == 1));
    }
}
