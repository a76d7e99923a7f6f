//! Rendered browser session.
//!
//! [`RenderedSession`] is the capability every browser-side component works
//! against: navigation with a wait condition, script evaluation, form input,
//! pointer and keyboard simulation, and cookie access. [`ChromiumSession`]
//! implements it over one chromiumoxide tab that lives for the whole run.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, SetUserAgentOverrideParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::layout::Point;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::storage_state::StoredCookie;
use crate::browser_setup::{BrowserOptions, LaunchedBrowser, launch_browser};
use crate::config::{CrawlConfig, WaitUntil};
use crate::crawl_engine::cleanup::{CleanupResult, cleanup_browser_and_data};
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::page_extractor::js_scripts::{
    READY_STATE_SCRIPT, clear_field_script, node_center_script, selector_visible_script,
};
use crate::utils::NETWORK_IDLE_WINDOW_MS;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Browser automation surface used by the rendered fetcher, the login flow
/// and the exploration pass.
#[async_trait]
pub trait RenderedSession: Send + Sync {
    /// Navigate and wait for `wait`, all within `timeout`.
    async fn navigate(&self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()>;

    /// URL of the current document.
    async fn current_url(&self) -> Result<String>;

    /// Evaluate a script, awaiting a returned promise. `null`/`undefined`
    /// come back as [`Value::Null`].
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Wait for the current document to reach `wait`.
    async fn wait_for_load(&self, wait: WaitUntil, timeout: Duration) -> Result<()>;

    /// Replace the value of the field matching `selector` by typing `value`.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    async fn click_selector(&self, selector: &str) -> Result<()>;

    /// Poll until the element matching `selector` is visible.
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Move the pointer over snapshot node `index`.
    async fn hover_node(&self, index: usize) -> Result<()>;

    /// Click snapshot node `index`.
    async fn click_node(&self, index: usize) -> Result<()>;

    async fn press_escape(&self) -> Result<()>;

    async fn cookies(&self) -> Result<Vec<StoredCookie>>;

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<()>;
}

/// One Chromium tab plus the browser that owns it.
pub struct ChromiumSession {
    page: Page,
    launched: Option<LaunchedBrowser>,
}

impl ChromiumSession {
    /// Launch Chromium as configured and open a blank tab carrying the
    /// configured User-Agent.
    ///
    /// # Errors
    ///
    /// Fails when no browser can be found, downloaded or started.
    pub async fn launch(config: &CrawlConfig) -> Result<Self> {
        let launched = launch_browser(&BrowserOptions::from_config(config)).await?;
        let page = launched
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;
        page.execute(SetUserAgentOverrideParams {
            user_agent: config.user_agent().to_string(),
            accept_language: None,
            platform: None,
            user_agent_metadata: None,
        })
        .await
        .context("Failed to set User-Agent")?;
        Ok(Self {
            page,
            launched: Some(launched),
        })
    }

    /// Close the browser and remove a temporary profile.
    pub async fn close(mut self) -> CleanupResult {
        match self.launched.take() {
            Some(launched) => cleanup_browser_and_data(launched).await,
            None => CleanupResult::Success,
        }
    }

    async fn node_center(&self, index: usize) -> Result<Point> {
        #[derive(Deserialize)]
        struct Center {
            x: f64,
            y: f64,
        }
        let value = self.evaluate(&node_center_script(index)).await?;
        if value.is_null() {
            anyhow::bail!("element {index} has no layout box");
        }
        let center: Center =
            serde_json::from_value(value).context("Unexpected element position shape")?;
        Ok(Point::new(center.x, center.y))
    }

    async fn poll_ready(&self, wait: WaitUntil) -> Result<()> {
        let mut last_resources: Option<u64> = None;
        let mut quiet_since = Instant::now();
        let idle_window = Duration::from_millis(NETWORK_IDLE_WINDOW_MS);

        loop {
            match self.evaluate(READY_STATE_SCRIPT).await {
                Ok(value) => {
                    let ready_state = value.get("readyState").and_then(Value::as_str).unwrap_or("");
                    let body_exists = value
                        .get("bodyExists")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    let resources = value.get("resources").and_then(Value::as_u64).unwrap_or(0);

                    let done = match wait {
                        WaitUntil::DomContentLoaded => {
                            matches!(ready_state, "interactive" | "complete")
                        }
                        WaitUntil::Load => ready_state == "complete" && body_exists,
                        WaitUntil::NetworkIdle => {
                            if last_resources != Some(resources) {
                                last_resources = Some(resources);
                                quiet_since = Instant::now();
                            }
                            ready_state == "complete" && quiet_since.elapsed() >= idle_window
                        }
                    };
                    if done {
                        return Ok(());
                    }
                }
                Err(e) => {
                    // The document may be mid-navigation
                    debug!(target: "sitescout::fetch", "Failed to check readyState: {e}, retrying");
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType) -> Result<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key("Escape")
            .code("Escape")
            .windows_virtual_key_code(27)
            .native_virtual_key_code(27)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build key event: {e}"))?;
        self.page
            .execute(params)
            .await
            .context("Failed to dispatch key event")?;
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(launched) = &self.launched {
            warn!(target: "sitescout::cleanup", "Browser session dropped without close; aborting handler");
            launched.handler.abort();
        }
    }
}

#[async_trait]
impl RenderedSession for ChromiumSession {
    async fn navigate(&self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        with_page_timeout(
            async {
                self.page
                    .goto(url)
                    .await
                    .with_context(|| format!("Navigation to {url} failed"))?;
                Ok(())
            },
            timeout,
            "navigation",
        )
        .await?;
        let remaining = timeout.saturating_sub(started.elapsed());
        self.wait_for_load(wait, remaining).await
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("Failed to read page URL")?
            .unwrap_or_default();
        Ok(url)
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build evaluate params: {e}"))?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .context("Script evaluation failed")?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn wait_for_load(&self, wait: WaitUntil, timeout: Duration) -> Result<()> {
        with_page_timeout(
            async {
                self.poll_ready(wait).await?;
                Ok(())
            },
            timeout,
            "page load",
        )
        .await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("No element matches {selector}"))?;
        self.evaluate(&clear_field_script(selector)).await?;
        element
            .click()
            .await
            .with_context(|| format!("Failed to focus {selector}"))?;
        element
            .type_str(value)
            .await
            .with_context(|| format!("Failed to type into {selector}"))?;
        Ok(())
    }

    async fn click_selector(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("No element matches {selector}"))?
            .click()
            .await
            .with_context(|| format!("Failed to click {selector}"))?;
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let script = selector_visible_script(selector);
        with_page_timeout(
            async {
                loop {
                    if self.evaluate(&script).await?.as_bool() == Some(true) {
                        return Ok(());
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            },
            timeout,
            "visibility wait",
        )
        .await
    }

    async fn hover_node(&self, index: usize) -> Result<()> {
        let point = self.node_center(index).await?;
        self.page
            .move_mouse(point)
            .await
            .context("Failed to move pointer")?;
        Ok(())
    }

    async fn click_node(&self, index: usize) -> Result<()> {
        let point = self.node_center(index).await?;
        self.page.click(point).await.context("Failed to click")?;
        Ok(())
    }

    async fn press_escape(&self) -> Result<()> {
        self.dispatch_key(DispatchKeyEventType::KeyDown).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp).await
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("Failed to read cookies")?;
        Ok(cookies.into_iter().map(stored_from_cdp).collect())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        let params = cookies
            .iter()
            .map(cdp_from_stored)
            .collect::<Result<Vec<_>>>()?;
        if params.is_empty() {
            return Ok(());
        }
        self.page
            .set_cookies(params)
            .await
            .context("Failed to set cookies")?;
        Ok(())
    }
}

fn stored_from_cdp(cookie: Cookie) -> StoredCookie {
    let same_site = cookie
        .same_site
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| v.as_str().map(String::from));
    StoredCookie {
        name: cookie.name,
        value: cookie.value,
        domain: cookie.domain,
        path: cookie.path,
        expires: cookie.expires,
        http_only: cookie.http_only,
        secure: cookie.secure,
        same_site,
    }
}

fn cdp_from_stored(cookie: &StoredCookie) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .secure(cookie.secure)
        .http_only(cookie.http_only);
    if !cookie.is_session() {
        builder = builder.expires(TimeSinceEpoch::new(cookie.expires));
    }
    if let Some(same_site) = cookie
        .same_site
        .as_ref()
        .and_then(|s| serde_json::from_value::<CookieSameSite>(Value::String(s.clone())).ok())
    {
        builder = builder.same_site(same_site);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid cookie {}: {e}", cookie.name))
}
