//! Browser-driven order-history extraction for Coupang Taiwan.
//!
//! Drives a real Chrome session (persistent profile, anti-automation
//! flags) through login and onto the order-history pages, then runs a
//! stack of extraction strategies against each page: structured DOM
//! selectors, free-text pattern matching, embedded JSON, and passive
//! network interception. Extracted records are merged into the durable
//! store owned by `purchase_store`.

pub mod config;
pub mod error;
pub mod humanize;
pub mod pagination;
pub mod push;
pub mod run;
pub mod selectors;
pub mod session;
pub mod strategies;
pub mod wait;

pub use config::{DelayConfig, ScraperConfig};
pub use error::ScrapeError;
pub use push::{IngestResponse, PushClient, PushError};
pub use run::{RunSummary, Scraper};
