//! Bounded polling for conditions resolved by the page or the operator.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

/// Polls `probe` every `interval` until it reports true, failing with a
/// named timeout once `limit` elapses. Every blocking wait in the session
/// controller goes through here so no phase can hang forever.
pub async fn poll_until<F, Fut>(
    phase: &'static str,
    limit: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<(), ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if probe().await {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ScrapeError::Timeout {
                phase,
                seconds: limit.as_secs(),
            });
        }
        tokio::time::sleep(interval).await;
    }
}
