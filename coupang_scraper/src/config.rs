//! Runtime configuration for a scrape run.

use std::path::PathBuf;

use crate::error::ScrapeError;

/// Login credentials for the target site.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Inter-action delay ranges in milliseconds. Everything is a range so the
/// run never emits a fixed-interval timing signature.
#[derive(Debug, Clone)]
pub struct DelayConfig {
    pub min_ms: u64,
    pub max_ms: u64,
    pub after_login_ms: u64,
    pub between_pages_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_ms: 800,
            max_ms: 2500,
            after_login_ms: 4000,
            between_pages_ms: 2000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub credentials: Credentials,
    pub headless: bool,
    pub output_path: PathBuf,
    /// Persistent browser profile, so prior login cookies survive runs.
    pub profile_dir: PathBuf,
    /// Failure screenshots land here.
    pub debug_dir: PathBuf,
    pub delay: DelayConfig,
    pub max_pages: usize,
    pub base_url: String,
    pub login_candidates: Vec<String>,
    pub order_history_candidates: Vec<String>,
}

impl ScraperConfig {
    /// Builds a config from the environment. Credentials are required up
    /// front; nothing launches without them.
    pub fn from_env() -> Result<Self, ScrapeError> {
        let email = env_trimmed("COUPANG_EMAIL");
        let password = env_trimmed("COUPANG_PASSWORD");
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) => (e, p),
            _ => return Err(ScrapeError::MissingCredentials),
        };

        let headless = matches!(
            std::env::var("COUPANG_HEADLESS").as_deref(),
            Ok("1") | Ok("true")
        );
        let output_path = env_trimmed("COUPANG_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("purchases.json"));
        let max_pages = env_trimmed("COUPANG_MAX_PAGES")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(50);

        let profile_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coupang-orders")
            .join("profile");

        Ok(Self {
            credentials: Credentials { email, password },
            headless,
            output_path,
            profile_dir,
            debug_dir: PathBuf::from("debug"),
            delay: DelayConfig::default(),
            max_pages,
            base_url: "https://www.tw.coupang.com".to_string(),
            login_candidates: vec![
                "https://login.tw.coupang.com/".to_string(),
                "https://www.tw.coupang.com/login".to_string(),
                "https://member.tw.coupang.com/login".to_string(),
                "https://member.tw.coupang.com/account/login".to_string(),
            ],
            order_history_candidates: vec![
                "https://mc.tw.coupang.com/ssr/desktop/order/list".to_string(),
                "https://www.tw.coupang.com/buyer/order-history".to_string(),
                "https://www.tw.coupang.com/order/list".to_string(),
            ],
        })
    }
}

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
