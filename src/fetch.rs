use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, info};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const SCROLL_PAUSE: Duration = Duration::from_millis(1500);
// Bound on scroll rounds for pages that keep appending content forever.
const MAX_SCROLL_ROUNDS: usize = 20;

/// Fetch a page through a headless browser and return the rendered HTML.
///
/// Scrolls to the bottom until the page height stops growing so that
/// lazily-loaded content is present in the snapshot. Blocking; callers on
/// the async runtime go through `spawn_blocking`.
pub fn fetch_page(url: &str) -> Result<String> {
    info!("Launching headless browser");
    let options = LaunchOptions::default_builder()
        .headless(true)
        .window_size(Some((1920, 1080)))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser options: {}", e))?;
    let browser = Browser::new(options).context("Failed to launch browser")?;

    let tab = browser.new_tab().context("Failed to open tab")?;
    tab.set_default_timeout(PAGE_LOAD_TIMEOUT);

    info!("Loading {}", url);
    tab.navigate_to(url)
        .with_context(|| format!("Failed to navigate to {}", url))?;
    tab.wait_until_navigated().context("Page did not load")?;
    tab.wait_for_element("body").context("Page has no body")?;

    scroll_to_bottom(&tab)?;

    let html = tab.get_content().context("Failed to read page content")?;
    if html.is_empty() {
        anyhow::bail!("No HTML content retrieved from {}", url);
    }

    debug!("Fetched {} bytes from {}", html.len(), url);
    Ok(html)
}

/// Scroll until `document.body.scrollHeight` stabilizes, giving dynamic
/// content a pause to load after each step.
fn scroll_to_bottom(tab: &headless_chrome::Tab) -> Result<()> {
    let mut last_height = page_height(tab)?;

    for round in 0..MAX_SCROLL_ROUNDS {
        tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)
            .context("Scroll failed")?;
        std::thread::sleep(SCROLL_PAUSE);

        let height = page_height(tab)?;
        if height == last_height {
            debug!("Page height stable at {} after {} scrolls", height, round);
            return Ok(());
        }
        last_height = height;
    }

    debug!("Page still growing after {} scrolls, taking snapshot", MAX_SCROLL_ROUNDS);
    Ok(())
}

fn page_height(tab: &headless_chrome::Tab) -> Result<i64> {
    let result = tab
        .evaluate("document.body.scrollHeight", false)
        .context("Failed to read page height")?;
    Ok(result.value.and_then(|v| v.as_i64()).unwrap_or(0))
}
