//! Fetch through a persistent rendered session.

use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use super::session::RenderedSession;
use super::{FetchError, FetchResult, FetchedContent, Fetcher, RenderedLink, is_html_content_type};
use crate::config::{CrawlConfig, ScrollConfig, WaitUntil};
use crate::crawl_engine::page_timeout::{is_timeout, with_page_timeout};
use crate::utils::same_location;
use crate::page_extractor::js_scripts::{
    CONTENT_TYPE_SCRIPT, LINKS_SCRIPT, TITLE_SCRIPT, auto_scroll_script,
};

/// Navigates the session's tab once per fetch and reads title and links
/// from the live DOM. The session is borrowed and stays open afterwards.
///
/// A navigation failure or timeout skips the URL; nothing is retried.
pub struct RenderedFetcher<'s, S: ?Sized> {
    session: &'s S,
    wait: WaitUntil,
    timeout: Duration,
    scroll: ScrollConfig,
}

impl<'s, S: RenderedSession + ?Sized> RenderedFetcher<'s, S> {
    #[must_use]
    pub fn new(session: &'s S, config: &CrawlConfig) -> Self {
        Self {
            session,
            wait: config.wait_until(),
            timeout: config.timeout(),
            scroll: config.scroll(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &S {
        self.session
    }

    async fn read_string(&self, script: &str) -> Option<String> {
        match self.session.evaluate(script).await {
            Ok(value) => value.as_str().map(String::from),
            Err(e) => {
                debug!(target: "sitescout::fetch", "Script failed: {e:#}");
                None
            }
        }
    }

    async fn read_links(&self) -> Vec<RenderedLink> {
        match self.session.evaluate(LINKS_SCRIPT).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(target: "sitescout::links", "Unexpected link list shape: {e}");
                Vec::new()
            }),
            Err(e) => {
                warn!(target: "sitescout::links", "Failed to read links: {e:#}");
                Vec::new()
            }
        }
    }
}

/// Scroll to the bottom repeatedly so lazy content loads. Failures are
/// logged and ignored.
pub async fn auto_scroll<S: RenderedSession + ?Sized>(
    session: &S,
    scroll: ScrollConfig,
    timeout: Duration,
) {
    if !scroll.enabled || scroll.steps == 0 {
        return;
    }
    let budget = timeout + Duration::from_millis(scroll.delay_ms.saturating_mul(u64::from(scroll.steps)));
    let script = auto_scroll_script(scroll.steps, scroll.delay_ms);
    if let Err(e) = with_page_timeout(
        async { session.evaluate(&script).await.map(|_| ()) },
        budget,
        "auto-scroll",
    )
    .await
    {
        debug!(target: "sitescout::fetch", "Auto-scroll failed: {e:#}");
    }
}

#[async_trait]
impl<S: RenderedSession + ?Sized> Fetcher for RenderedFetcher<'_, S> {
    async fn fetch(&mut self, url: &str) -> Result<FetchResult, FetchError> {
        if let Err(e) = self.session.navigate(url, self.wait, self.timeout).await {
            return Err(if is_timeout(&e) {
                FetchError::Timeout(format!("{e:#}"))
            } else {
                FetchError::Network(format!("{e:#}"))
            });
        }

        let final_url = match self.session.current_url().await {
            Ok(current) if !current.is_empty() && !same_location(url, &current) => current,
            _ => url.to_string(),
        };
        let content_type = self
            .read_string(CONTENT_TYPE_SCRIPT)
            .await
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty());

        // Non-HTML documents are rejected by the caller; skip the DOM reads
        if !is_html_content_type(content_type.as_deref()) {
            return Ok(FetchResult {
                final_url,
                content_type,
                charset: None,
                content: FetchedContent::Live {
                    title: String::new(),
                    links: Vec::new(),
                },
            });
        }

        auto_scroll(self.session, self.scroll, self.timeout).await;

        let title = self.read_string(TITLE_SCRIPT).await.unwrap_or_default();
        let links = self.read_links().await;

        Ok(FetchResult {
            final_url,
            content_type,
            charset: None,
            content: FetchedContent::Live { title, links },
        })
    }
}
