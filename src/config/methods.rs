//! Builder methods available for all states

use std::path::PathBuf;
use std::time::Duration;

use super::builder::CrawlConfigBuilder;
use super::types::{LoginConfig, WaitUntil};

impl<State> CrawlConfigBuilder<State> {
    /// Stop after this many pages have been recorded.
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.draft.max_pages = max_pages;
        self
    }

    /// Maximum link depth from the start page. `0` means unbounded, matching
    /// the command-line convention.
    #[must_use]
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.draft.max_depth = (max_depth > 0).then_some(max_depth);
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.draft.timeout_secs = secs.max(1);
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.draft.delay = delay;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.draft.user_agent = user_agent.into();
        self
    }

    /// Treat `#fragment` variants of a URL as distinct pages.
    #[must_use]
    pub fn keep_fragment(mut self, keep: bool) -> Self {
        self.draft.keep_fragment = keep;
        self
    }

    #[must_use]
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.draft.max_bytes = max_bytes;
        self
    }

    /// Fetch through a Chromium session instead of plain HTTP.
    #[must_use]
    pub fn rendered(mut self, rendered: bool) -> Self {
        self.draft.rendered = rendered;
        self
    }

    #[must_use]
    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.draft.wait_until = wait_until;
        self
    }

    /// Show the browser window. Only meaningful with `rendered(true)`.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.draft.headless = headless;
        self
    }

    #[must_use]
    pub fn ignore_https_errors(mut self, ignore: bool) -> Self {
        self.draft.ignore_https_errors = ignore;
        self
    }

    /// Scroll to the bottom `steps` times, pausing `delay_ms` between steps.
    #[must_use]
    pub fn auto_scroll(mut self, enabled: bool, steps: u32, delay_ms: u64) -> Self {
        self.draft.scroll.enabled = enabled;
        self.draft.scroll.steps = steps;
        self.draft.scroll.delay_ms = delay_ms;
        self
    }

    /// Log in before the first navigation. Validated by `build()`.
    #[must_use]
    pub fn login(mut self, login: LoginConfig) -> Self {
        self.login = Some(login);
        self
    }

    #[must_use]
    pub fn storage_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.draft.storage_state_path = path;
        self
    }

    #[must_use]
    pub fn extract_elements(mut self, extract: bool) -> Self {
        self.draft.extract_elements = extract;
        self
    }

    #[must_use]
    pub fn explore(mut self, explore: bool) -> Self {
        self.draft.explore = explore;
        self
    }

    #[must_use]
    pub fn safety_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.draft.safety_config_path = path.into();
        self
    }

    #[must_use]
    pub fn pages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft.pages_dir = dir.into();
        self
    }
}
