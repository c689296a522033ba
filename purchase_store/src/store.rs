//! Load/merge/persist logic for the purchase store file.

use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::category::categorize;
use crate::record::{PurchaseRecord, PurchaseStore};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counts reported back from a merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl PurchaseStore {
    /// Loads the store from disk. A missing or unparseable file yields a
    /// fresh empty store; corruption is reported but never fatal.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(
                    "store file {} is corrupt ({}), starting fresh",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Append-only merge used by the scraper: a record is inserted only if
    /// its `order_id` is unseen. Existing records are never touched.
    pub fn merge(&mut self, batch: Vec<PurchaseRecord>) -> MergeOutcome {
        let mut seen: std::collections::HashSet<String> = self
            .purchases
            .iter()
            .map(|p| p.order_id.clone())
            .collect();
        let mut outcome = MergeOutcome::default();
        for record in batch {
            if seen.insert(record.order_id.clone()) {
                self.purchases.push(record);
                outcome.added += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        outcome
    }

    /// Upsert merge used by the ingestion path, keyed on `name|date|price`.
    /// Unseen records are inserted with defaults and a category; a seen
    /// record with a different status gets its status moved forward in
    /// place. Anything else is skipped.
    pub fn reconcile(&mut self, batch: Vec<PurchaseRecord>) -> MergeOutcome {
        let mut index: std::collections::HashMap<String, usize> = self
            .purchases
            .iter()
            .enumerate()
            .map(|(i, p)| (p.content_key(), i))
            .collect();
        let mut outcome = MergeOutcome::default();
        for incoming in batch {
            match index.get(&incoming.content_key()) {
                Some(&i) => {
                    let existing = &mut self.purchases[i];
                    if existing.status != incoming.status && !incoming.status.is_empty() {
                        tracing::info!(
                            "status update for {}: {} -> {}",
                            existing.order_id,
                            existing.status,
                            incoming.status
                        );
                        existing.status = incoming.status;
                        existing.scraped_at = Utc::now().to_rfc3339();
                        outcome.updated += 1;
                    } else {
                        outcome.skipped += 1;
                    }
                }
                None => {
                    let mut record = incoming;
                    if record.category.is_empty() {
                        record.category = categorize(&record.name).to_string();
                    }
                    index.insert(record.content_key(), self.purchases.len());
                    self.purchases.push(record);
                    outcome.added += 1;
                }
            }
        }
        outcome
    }

    /// Sorts by date descending, recomputes aggregates, stamps
    /// `last_updated`, and writes the whole file atomically
    /// (write-temp-then-rename, so readers never see a truncated store).
    pub fn save(&mut self, path: &Path) -> Result<(), StoreError> {
        // Stable sort: records with equal or empty dates keep their order.
        self.purchases.sort_by(|a, b| b.date.cmp(&a.date));
        self.meta.total_spent = self.purchases.iter().map(|p| p.price).sum();
        self.meta.total_items = self.purchases.len();
        self.meta.last_updated = Utc::now().to_rfc3339();

        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        tracing::info!(
            "saved {} purchases ({} {:.0}) to {}",
            self.meta.total_items,
            self.meta.currency,
            self.meta.total_spent,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, date: &str, name: &str, price: f64) -> PurchaseRecord {
        PurchaseRecord::new(id, date.into(), name.into(), price)
    }

    #[test]
    fn merge_skips_duplicate_ids() {
        let mut store = PurchaseStore::default();
        let batch = vec![rec("a1", "2025-01-01", "米", 100.0), rec("a2", "2025-01-02", "茶", 50.0)];
        let first = store.merge(batch.clone());
        assert_eq!(first.added, 2);

        let second = store.merge(batch);
        assert_eq!(second.added, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.purchases.len(), 2);
    }

    #[test]
    fn merge_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.json");
        let batch = vec![rec("a1", "2025-01-01", "米", 100.0), rec("a2", "2025-01-02", "茶", 50.0)];

        let mut store = PurchaseStore::load(&path);
        store.merge(batch.clone());
        store.save(&path).unwrap();
        let once = fs::read_to_string(&path).unwrap();
        let parsed_once: PurchaseStore = serde_json::from_str(&once).unwrap();

        let mut store = PurchaseStore::load(&path);
        store.merge(batch);
        store.save(&path).unwrap();
        let twice = fs::read_to_string(&path).unwrap();
        let parsed_twice: PurchaseStore = serde_json::from_str(&twice).unwrap();

        assert_eq!(parsed_once.purchases, parsed_twice.purchases);
    }

    #[test]
    fn merge_never_overwrites_existing_records() {
        let mut store = PurchaseStore::default();
        store.merge(vec![rec("a1", "2025-01-01", "原始", 100.0)]);
        store.merge(vec![rec("a1", "2025-06-01", "改過", 999.0)]);
        assert_eq!(store.purchases[0].name, "原始");
        assert_eq!(store.purchases[0].price, 100.0);
    }

    #[test]
    fn save_sorts_by_date_descending_and_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.json");
        let mut store = PurchaseStore::default();
        store.merge(vec![
            rec("a1", "2025-01-01", "一", 1.0),
            rec("a2", "2025-03-01", "二", 2.0),
            rec("a3", "", "三", 3.0),
            rec("a4", "", "四", 4.0),
            rec("a5", "2025-02-01", "五", 5.0),
        ]);
        store.save(&path).unwrap();

        let dates: Vec<&str> = store.purchases.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-03-01", "2025-02-01", "2025-01-01", "", ""]);
        // Empty dates keep their relative order.
        let empties: Vec<&str> = store
            .purchases
            .iter()
            .filter(|p| p.date.is_empty())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(empties, vec!["三", "四"]);
    }

    #[test]
    fn save_recomputes_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.json");
        let mut store = PurchaseStore::default();
        store.meta.total_spent = 9999.0;
        store.merge(vec![rec("a1", "2025-01-01", "米", 100.0), rec("a2", "2025-01-02", "茶", 50.5)]);
        store.save(&path).unwrap();
        assert_eq!(store.meta.total_spent, 150.5);
        assert_eq!(store.meta.total_items, 2);
    }

    #[test]
    fn corrupt_file_yields_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.json");
        fs::write(&path, "{not json at all").unwrap();
        let store = PurchaseStore::load(&path);
        assert!(store.purchases.is_empty());
    }

    #[test]
    fn missing_file_yields_fresh_store() {
        let store = PurchaseStore::load(Path::new("/nonexistent/purchases.json"));
        assert!(store.purchases.is_empty());
    }

    #[test]
    fn reconcile_inserts_and_categorizes() {
        let mut store = PurchaseStore::default();
        let outcome = store.reconcile(vec![rec("", "2025-01-01", "濾掛咖啡", 299.0)]);
        assert_eq!(outcome.added, 1);
        assert_eq!(store.purchases[0].category, "食品/飲料");
        assert!(!store.purchases[0].order_id.is_empty());
    }

    #[test]
    fn reconcile_updates_status_in_place() {
        let mut store = PurchaseStore::default();
        let mut first = rec("a1", "2025-01-01", "咖啡", 299.0);
        first.status = "配送中".into();
        store.reconcile(vec![first]);

        let mut second = rec("ignored", "2025-01-01", "咖啡", 299.0);
        second.status = "已送達".into();
        let outcome = store.reconcile(vec![second]);

        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.updated, 1);
        assert_eq!(store.purchases.len(), 1);
        assert_eq!(store.purchases[0].status, "已送達");
        // The original id survives the upsert.
        assert_eq!(store.purchases[0].order_id, "a1");
    }

    #[test]
    fn reconcile_skips_identical_records() {
        let mut store = PurchaseStore::default();
        store.reconcile(vec![rec("a1", "2025-01-01", "咖啡", 299.0)]);
        let outcome = store.reconcile(vec![rec("a1", "2025-01-01", "咖啡", 299.0)]);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.updated, 0);
    }

    #[test]
    fn saved_file_is_parseable_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.json");
        let mut store = PurchaseStore::default();
        store.merge(vec![rec("a1", "2025-01-01", "米", 100.0)]);
        store.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains('\n'));
        let parsed: PurchaseStore = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.purchases.len(), 1);
        // No temp file left behind.
        assert!(!path.with_extension("json.tmp").exists());
    }
}
