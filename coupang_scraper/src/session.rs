//! Browser session controller.
//!
//! Owns the Chrome session and walks it from a cold start to an
//! authenticated order-history page:
//!
//! `Init -> HomepageCheck -> {AlreadyAuthenticated | LoginDiscovery} ->
//! CredentialEntry -> {ChallengePending -> resolved} -> NavigatingToOrders
//! -> OrderPageReached | Failed`
//!
//! Every blocking step has a bounded wait and a manual-handoff fallback;
//! exceeding a bound is fatal for the run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::humanize;
use crate::selectors;
use crate::wait::poll_until;

const NAV_TIMEOUT_SECS: u64 = 20;
const BARRIER_WAIT: Duration = Duration::from_secs(180);
const MANUAL_LOGIN_WAIT: Duration = Duration::from_secs(300);
const CHALLENGE_WAIT: Duration = Duration::from_secs(180);
const ORDER_PAGE_WAIT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Minimum body length for an order page to count as rendered.
const MIN_ORDER_PAGE_CONTENT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    ChallengePending,
    Authenticated,
}

pub struct Session {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    page: Page,
    config: Arc<ScraperConfig>,
    auth: AuthState,
}

impl Session {
    /// Launches Chrome on the persistent profile and opens a blank page.
    pub async fn open(config: Arc<ScraperConfig>) -> Result<Self, ScrapeError> {
        let chrome = find_chrome().ok_or(ScrapeError::ChromeNotFound)?;
        std::fs::create_dir_all(&config.profile_dir)?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .viewport(None)
            .user_data_dir(&config.profile_dir)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            config,
            auth: AuthState::Unauthenticated,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn auth(&self) -> AuthState {
        self.auth
    }

    /// Drives the full state machine until the order-history page is live.
    pub async fn reach_order_page(&mut self) -> Result<(), ScrapeError> {
        tracing::info!("phase: homepage check");
        self.try_goto(&self.config.base_url.clone()).await;
        humanize::pause(&self.config.delay).await;
        humanize::mouse_move(&self.page).await;
        self.wait_for_barrier_clear("homepage").await?;

        if self.probe_logged_in().await {
            tracing::info!("phase: already authenticated (profile cookies)");
            self.auth = AuthState::Authenticated;
        } else {
            self.login().await?;
        }

        tracing::info!("phase: navigating to orders");
        self.navigate_to_orders().await?;
        tracing::info!("phase: order page reached ({})", self.current_url().await);
        Ok(())
    }

    /// Closes the browser. Best-effort; the handler task is always stopped.
    pub async fn close(mut self) {
        let _ = self.browser.close().await;
        self.handler_task.abort();
    }

    /// Full-page screenshot for operator diagnosis. Never fatal.
    pub async fn capture_failure(&self, label: &str) {
        if std::fs::create_dir_all(&self.config.debug_dir).is_err() {
            return;
        }
        let path = self.config.debug_dir.join(format!("coupang-{label}.png"));
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        match self.page.save_screenshot(params, &path).await {
            Ok(_) => tracing::info!("saved screenshot to {}", path.display()),
            Err(err) => tracing::debug!("screenshot failed: {err}"),
        }
    }

    // ── Homepage / access barrier ───────────────────────────────────

    pub async fn body_text(&self) -> String {
        self.page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_default()
    }

    pub async fn current_url(&self) -> String {
        self.page.url().await.ok().flatten().unwrap_or_default()
    }

    /// The edge protection serves an interstitial denial page; it is
    /// expected to clear on its own or after a manual refresh.
    async fn wait_for_barrier_clear(&self, label: &str) -> Result<(), ScrapeError> {
        if !is_access_denied(&self.body_text().await) {
            return Ok(());
        }
        tracing::warn!("{label} blocked by access barrier, waiting for it to clear");
        let session = &*self;
        poll_until("access barrier", BARRIER_WAIT, POLL_INTERVAL, move || async move {
            !is_access_denied(&session.body_text().await)
        })
        .await?;
        tracing::info!("access barrier cleared");
        Ok(())
    }

    async fn probe_logged_in(&self) -> bool {
        for sel in selectors::LOGGED_IN_MARKERS {
            if is_visible(&self.page, sel).await {
                return resolve_auth(true, false);
            }
        }
        let mut login_link = false;
        for sel in selectors::HOME_LOGIN {
            if is_visible(&self.page, sel).await {
                login_link = true;
                break;
            }
        }
        resolve_auth(false, login_link)
    }

    // ── Login ───────────────────────────────────────────────────────

    async fn login(&mut self) -> Result<(), ScrapeError> {
        tracing::info!("phase: login discovery");
        if !self.find_login_page().await {
            tracing::warn!("no login page found, handing off to the operator");
            self.manual_login_wait().await?;
            self.auth = AuthState::Authenticated;
            return Ok(());
        }

        tracing::info!("phase: credential entry ({})", self.current_url().await);
        humanize::mouse_move(&self.page).await;
        let email_ok = self
            .fill_credential(selectors::EMAIL_INPUT, &self.config.credentials.email.clone())
            .await;
        humanize::jitter(500, 1200).await;
        let password_ok = self
            .fill_credential(
                selectors::PASSWORD_INPUT,
                &self.config.credentials.password.clone(),
            )
            .await;

        if !email_ok || !password_ok {
            tracing::warn!("credential fields not locatable, handing off to the operator");
            self.capture_failure("login-fields").await;
            self.manual_login_wait().await?;
            self.auth = AuthState::Authenticated;
            return Ok(());
        }

        humanize::jitter(500, 1000).await;
        humanize::mouse_move(&self.page).await;
        self.submit_login().await;

        tokio::time::sleep(Duration::from_millis(self.config.delay.after_login_ms)).await;
        self.wait_out_challenge().await?;

        if is_login_url(&self.current_url().await) {
            tracing::warn!("still on the login page after submit, waiting for manual completion");
            let session = &*self;
            poll_until("login completion", CHALLENGE_WAIT, POLL_INTERVAL, move || async move {
                !is_login_url(&session.current_url().await)
            })
            .await?;
        }

        tracing::info!("phase: authenticated");
        self.auth = AuthState::Authenticated;
        Ok(())
    }

    /// Tries (a) a login affordance discovered on the homepage, then
    /// (b) the known candidate login URLs.
    async fn find_login_page(&self) -> bool {
        for sel in selectors::HOME_LOGIN {
            let Some(el) = visible_element(&self.page, sel).await else {
                continue;
            };
            let href = el.attribute("href").await.ok().flatten().unwrap_or_default();
            if !href.is_empty() && !is_login_url(&href) {
                continue;
            }
            if el.click().await.is_err() {
                continue;
            }
            humanize::jitter(1500, 3000).await;
            if is_login_url(&self.current_url().await) || self.has_credential_form().await {
                tracing::info!("login page via homepage affordance: {}", self.current_url().await);
                return true;
            }
        }

        for url in &self.config.login_candidates {
            tracing::debug!("trying login candidate {url}");
            self.try_goto(url).await;
            humanize::jitter(1500, 2500).await;
            let body = self.body_text().await;
            if body.contains("找不到頁面") || body.contains("404") || body.contains("Not Found") {
                continue;
            }
            if self.wait_for_barrier_clear("login page").await.is_err() {
                continue;
            }
            if self.has_credential_form().await {
                tracing::info!("login page via candidate URL: {url}");
                return true;
            }
        }
        false
    }

    async fn has_credential_form(&self) -> bool {
        for sel in selectors::EMAIL_INPUT {
            if is_visible(&self.page, sel).await {
                return true;
            }
        }
        is_visible(&self.page, "input[type=\"text\"]").await
    }

    async fn fill_credential(&self, candidates: &'static [&'static str], value: &str) -> bool {
        for sel in candidates {
            let Some(el) = visible_element(&self.page, sel).await else {
                continue;
            };
            if humanize::type_text(&el, value).await.is_ok() {
                return true;
            }
        }
        false
    }

    async fn submit_login(&self) {
        for sel in selectors::SUBMIT_BUTTON {
            if let Some(el) = visible_element(&self.page, sel).await {
                humanize::jitter(200, 500).await;
                if el.click().await.is_ok() {
                    tracing::info!("submitted login via {sel}");
                    return;
                }
            }
        }
        // Default form-submit key as the last resort.
        for sel in selectors::PASSWORD_INPUT {
            if let Ok(el) = self.page.find_element(*sel).await {
                if el.press_key("Enter").await.is_ok() {
                    tracing::info!("submitted login via Enter");
                    return;
                }
            }
        }
    }

    /// Post-submit CAPTCHA / verification step. Resolution may be automatic
    /// or manual; either way the URL stops matching the challenge patterns.
    async fn wait_out_challenge(&mut self) -> Result<(), ScrapeError> {
        if !is_challenge_url(&self.current_url().await) {
            return Ok(());
        }
        tracing::warn!("phase: challenge pending, waiting for resolution");
        self.auth = AuthState::ChallengePending;
        let session = &*self;
        poll_until("challenge resolution", CHALLENGE_WAIT, POLL_INTERVAL, move || async move {
            !is_challenge_url(&session.current_url().await)
        })
        .await?;
        tracing::info!("challenge resolved");
        Ok(())
    }

    async fn manual_login_wait(&self) -> Result<(), ScrapeError> {
        tracing::info!(
            "complete the login in the browser window (up to {}s)",
            MANUAL_LOGIN_WAIT.as_secs()
        );
        let session = &*self;
        poll_until("manual login", MANUAL_LOGIN_WAIT, POLL_INTERVAL, move || async move {
            let url = session.current_url().await;
            url.contains("coupang") && !is_login_url(&url)
        })
        .await
    }

    // ── Order page ──────────────────────────────────────────────────

    async fn navigate_to_orders(&self) -> Result<(), ScrapeError> {
        for url in &self.config.order_history_candidates {
            tracing::debug!("trying order-history candidate {url}");
            self.try_goto(url).await;
            humanize::pause(&self.config.delay).await;
            if self.order_page_live().await {
                return Ok(());
            }
        }

        // The operator may need to click through to the order page
        // themselves; watch for arrival.
        tracing::info!(
            "order page not reached directly; navigate to it in the browser (up to {}s)",
            ORDER_PAGE_WAIT.as_secs()
        );
        let session = &*self;
        poll_until("order page arrival", ORDER_PAGE_WAIT, POLL_INTERVAL, move || {
            session.order_page_live()
        })
        .await
    }

    /// An order page is live when the URL matches, the body is non-trivial,
    /// and no error or barrier marker is present.
    async fn order_page_live(&self) -> bool {
        let url = self.current_url().await;
        if !url.contains("order") {
            return false;
        }
        let body = self.body_text().await;
        body.len() > MIN_ORDER_PAGE_CONTENT
            && !body.contains("找不到頁面")
            && !is_access_denied(&body)
    }

    async fn try_goto(&self, url: &str) {
        match tokio::time::timeout(
            Duration::from_secs(NAV_TIMEOUT_SECS),
            self.page.goto(url),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::debug!("navigation to {url} failed: {err}"),
            Err(_) => tracing::debug!("navigation to {url} timed out"),
        }
    }
}

/// An explicit account marker wins outright; failing that, the absence of
/// any login affordance on the homepage is read as an authenticated
/// session. Only a visible login link means logged out.
pub(crate) fn resolve_auth(marker_visible: bool, login_link_visible: bool) -> bool {
    marker_visible || !login_link_visible
}

/// Interstitial denial page served by the site's edge protection.
pub fn is_access_denied(body_text: &str) -> bool {
    body_text.contains("Access Denied") || body_text.contains("Reference #")
}

pub fn is_login_url(url: &str) -> bool {
    url.contains("login") || url.contains("signin")
}

pub fn is_challenge_url(url: &str) -> bool {
    url.contains("captcha") || url.contains("challenge") || url.contains("verify")
}

/// Visibility probe: the element exists and has a non-empty box.
pub(crate) async fn is_visible(page: &Page, selector: &str) -> bool {
    let sel = match serde_json::to_string(selector) {
        Ok(sel) => sel,
        Err(_) => return false,
    };
    let js = format!(
        "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
         const r = el.getBoundingClientRect(); return r.width > 0 && r.height > 0; }})()"
    );
    page.evaluate(js)
        .await
        .ok()
        .and_then(|v| v.into_value::<bool>().ok())
        .unwrap_or(false)
}

pub(crate) async fn visible_element(page: &Page, selector: &str) -> Option<Element> {
    if !is_visible(page, selector).await {
        return None;
    }
    page.find_element(selector).await.ok()
}

fn find_chrome() -> Option<String> {
    for name in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];
    candidates
        .iter()
        .find(|c| Path::new(c).exists())
        .map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_markers() {
        assert!(is_access_denied("Access Denied\nReference #18.abc"));
        assert!(is_access_denied("Reference #18.4fe1"));
        assert!(!is_access_denied("我的訂單"));
    }

    #[test]
    fn login_url_patterns() {
        assert!(is_login_url("https://login.tw.coupang.com/"));
        assert!(is_login_url("https://member.tw.coupang.com/account/signin"));
        assert!(!is_login_url("https://www.tw.coupang.com/order/list"));
    }

    #[test]
    fn auth_resolution_keys_on_the_login_link() {
        assert!(resolve_auth(true, false));
        assert!(resolve_auth(true, true));
        assert!(!resolve_auth(false, true));
        // Neither a marker nor a login link: treated as authenticated, so
        // the order-page navigation is attempted instead of a login walk.
        assert!(resolve_auth(false, false));
    }

    #[test]
    fn challenge_url_patterns() {
        assert!(is_challenge_url("https://x.coupang.com/captcha?x=1"));
        assert!(is_challenge_url("https://x.coupang.com/member/verify"));
        assert!(!is_challenge_url("https://x.coupang.com/order/list"));
    }
}
