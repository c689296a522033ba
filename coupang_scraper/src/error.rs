//! Error types for the scraper pipeline.

use chromiumoxide::error::CdpError;

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("browser error: {0}")]
    Browser(#[from] CdpError),
    #[error("failed to configure browser: {0}")]
    Launch(String),
    #[error("Chrome/Chromium executable not found; install Chrome to scrape")]
    ChromeNotFound,
    /// A bounded wait ran out. Fatal for the run.
    #[error("{phase} timed out after {seconds}s")]
    Timeout { phase: &'static str, seconds: u64 },
    #[error("store error: {0}")]
    Store(#[from] purchase_store::StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("COUPANG_EMAIL and COUPANG_PASSWORD must be set")]
    MissingCredentials,
}
