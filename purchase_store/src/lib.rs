//! Durable purchase-record storage for the Coupang order scraper.
//!
//! Owns the persisted JSON store (`purchases.json`), the record data model,
//! field normalization, category lookup, and the two merge policies used by
//! the scraper and the ingestion path.

pub mod category;
pub mod normalize;
pub mod record;
pub mod store;

pub use category::categorize;
pub use record::{PurchaseRecord, PurchaseStore, StoreMeta};
pub use store::{MergeOutcome, StoreError};
