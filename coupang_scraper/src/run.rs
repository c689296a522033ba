//! Run orchestrator: session, strategies, pagination, and the final merge.

use std::collections::HashMap;
use std::sync::Arc;

use purchase_store::{PurchaseRecord, PurchaseStore};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::humanize;
use crate::pagination::{self, PageBudget};
use crate::session::Session;
use crate::strategies::{self, network::NetworkCollector};

/// What a completed run did, for the operator's eyes.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pages: usize,
    pub scraped: usize,
    pub added: usize,
    pub skipped: usize,
    pub total_spent: f64,
    pub total_items: usize,
}

pub struct Scraper {
    config: Arc<ScraperConfig>,
}

impl Scraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The full pipeline: launch, authenticate, paginate and extract, then
    /// merge into the durable store. A fatal error mid-run persists
    /// nothing; partial pages are only saved by a run that completes.
    pub async fn run(&self) -> Result<RunSummary, ScrapeError> {
        let mut session = Session::open(Arc::clone(&self.config)).await?;
        let collector = NetworkCollector::attach(session.page()).await?;

        let scraped = match self.scrape_all(&mut session).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("run failed: {err}");
                session.capture_failure("run-failed").await;
                session.close().await;
                return Err(err);
            }
        };
        let (pages, mut records) = scraped;

        let intercepted = collector.drain();
        tracing::info!(
            "{} records from pages, {} from network interception",
            records.len(),
            intercepted.len()
        );
        records.extend(intercepted);
        session.close().await;

        let records = dedup_last_write_wins(records);
        let scraped_count = records.len();

        let mut store = PurchaseStore::load(&self.config.output_path);
        let outcome = store.merge(records);
        store.save(&self.config.output_path)?;
        tracing::info!(
            "merged into {}: {} added, {} already present",
            self.config.output_path.display(),
            outcome.added,
            outcome.skipped
        );

        Ok(RunSummary {
            pages,
            scraped: scraped_count,
            added: outcome.added,
            skipped: outcome.skipped,
            total_spent: store.meta.total_spent,
            total_items: store.meta.total_items,
        })
    }

    async fn scrape_all(
        &self,
        session: &mut Session,
    ) -> Result<(usize, Vec<PurchaseRecord>), ScrapeError> {
        session.reach_order_page().await?;

        let mut budget = PageBudget::new(self.config.max_pages);
        let mut records = Vec::new();
        loop {
            humanize::scroll(session.page()).await;
            let page_records =
                strategies::extract_page(session.page(), &self.config.base_url).await;
            tracing::info!(
                "page {}: {} records",
                budget.visited() + 1,
                page_records.len()
            );
            records.extend(page_records);

            if !budget.advance() {
                break;
            }
            let Some(next) = pagination::next_control(session.page()).await else {
                tracing::info!("no further pages");
                break;
            };
            if !pagination::advance(session.page(), next, &self.config.delay).await {
                tracing::warn!("next-page click failed, stopping pagination");
                break;
            }
        }
        Ok((budget.visited(), records))
    }
}

/// In-run dedup by order id, last write wins, first-seen order preserved.
/// Later sightings of an order carry the freshest delivery status.
pub fn dedup_last_write_wins(records: Vec<PurchaseRecord>) -> Vec<PurchaseRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<PurchaseRecord> = Vec::with_capacity(records.len());
    for rec in records {
        match index.get(&rec.order_id) {
            Some(&i) => out[i] = rec,
            None => {
                index.insert(rec.order_id.clone(), out.len());
                out.push(rec);
            }
        }
    }
    out
}
