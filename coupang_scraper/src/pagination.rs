//! Order-history pagination.

use std::time::Duration;

use chromiumoxide::Page;

use crate::config::DelayConfig;
use crate::humanize;
use crate::selectors;
use crate::session::is_visible;

/// Hard ceiling on pages visited in one run, independent of what the
/// pagination controls claim. Guards against a next-button that never
/// disables.
#[derive(Debug)]
pub struct PageBudget {
    max: usize,
    visited: usize,
}

impl PageBudget {
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            visited: 0,
        }
    }

    /// Records a visited page. Returns false once the budget is spent.
    pub fn advance(&mut self) -> bool {
        self.visited += 1;
        if self.visited >= self.max {
            tracing::warn!("page budget of {} reached, stopping pagination", self.max);
            return false;
        }
        true
    }

    pub fn visited(&self) -> usize {
        self.visited
    }
}

/// Finds a usable next-page control: visible, not disabled in any of the
/// ways the site expresses disabled.
pub async fn next_control(page: &Page) -> Option<&'static str> {
    for sel in selectors::NEXT_PAGE {
        if !is_visible(page, sel).await {
            continue;
        }
        if is_disabled(page, sel).await {
            tracing::debug!("next control {sel} is disabled, last page reached");
            continue;
        }
        return Some(sel);
    }
    None
}

async fn is_disabled(page: &Page, selector: &str) -> bool {
    let Ok(sel) = serde_json::to_string(selector) else {
        return true;
    };
    let js = format!(
        "(() => {{ const el = document.querySelector({sel}); if (!el) return true; \
         return el.disabled === true || el.hasAttribute('disabled') \
             || el.classList.contains('disabled') \
             || el.getAttribute('aria-disabled') === 'true'; }})()"
    );
    page.evaluate(js)
        .await
        .ok()
        .and_then(|v| v.into_value::<bool>().ok())
        .unwrap_or(true)
}

/// Upper bound on waiting for the post-click load to settle. The click may
/// trigger a full navigation or an in-place rerender; either way a hung
/// load must not stall the run.
const LOAD_SETTLE: Duration = Duration::from_secs(15);

/// Clicks through to the next page with humanized pacing and waits for the
/// new content to load before the next extraction pass.
pub async fn advance(page: &Page, selector: &str, delay: &DelayConfig) -> bool {
    humanize::mouse_move(page).await;
    humanize::jitter(300, 900).await;
    let Ok(el) = page.find_element(selector).await else {
        return false;
    };
    if el.click().await.is_err() {
        return false;
    }
    let _ = tokio::time::timeout(LOAD_SETTLE, page.wait_for_navigation()).await;
    tokio::time::sleep(Duration::from_millis(delay.between_pages_ms)).await;
    humanize::pause(delay).await;
    true
}
