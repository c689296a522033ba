//! Randomized human-like interaction noise.
//!
//! Side-effect-only: pointer drift, scroll bursts, and per-character typing
//! cadence injected between real actions. Failures here are swallowed; a
//! missed mouse wiggle must never abort a run.

use std::time::Duration;

use chromiumoxide::layout::Point;
use chromiumoxide::{Element, Page};
use rand::Rng;

use crate::config::DelayConfig;

/// Sleeps a random duration within `[min_ms, max_ms]`.
pub async fn jitter(min_ms: u64, max_ms: u64) {
    let ms = rand::thread_rng().gen_range(min_ms..=max_ms.max(min_ms + 1));
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Sleeps within the configured base delay range.
pub async fn pause(delay: &DelayConfig) {
    jitter(delay.min_ms, delay.max_ms).await;
}

/// Drifts the pointer to a random point in the upper viewport.
pub async fn mouse_move(page: &Page) {
    let (x, y) = {
        let mut rng = rand::thread_rng();
        (rng.gen_range(100.0..900.0), rng.gen_range(100.0..600.0))
    };
    let _ = page.move_mouse(Point::new(x, y)).await;
}

/// 2-4 scroll bursts of 200-600 px with human-ish gaps.
pub async fn scroll(page: &Page) {
    let bursts = rand::thread_rng().gen_range(2..=4);
    for _ in 0..bursts {
        let distance: u32 = rand::thread_rng().gen_range(200..600);
        let _ = page
            .evaluate(format!("window.scrollBy(0, {distance})"))
            .await;
        jitter(300, 800).await;
    }
}

/// Clears a field and types into it one character at a time with a
/// randomized inter-key delay.
pub async fn type_text(element: &Element, text: &str) -> Result<(), chromiumoxide::error::CdpError> {
    element.click().await?;
    jitter(200, 500).await;
    element
        .call_js_fn("function() { this.value = ''; }", false)
        .await?;
    for ch in text.chars() {
        element.type_str(ch.to_string()).await?;
        jitter(50, 150).await;
    }
    Ok(())
}
