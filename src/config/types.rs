//! Core configuration types for a discovery run
//!
//! `CrawlConfig` is immutable once built; every component reads it through
//! the getters in `getters.rs`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::{
    DEFAULT_MAX_BYTES, DEFAULT_MAX_PAGES, DEFAULT_OUTPUT_PATH, DEFAULT_PAGES_DIR,
    DEFAULT_SAFETY_CONFIG, DEFAULT_SCROLL_DELAY_MS, DEFAULT_SCROLL_STEPS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};

/// Condition a rendered navigation waits for before the page is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// `document.readyState === "complete"`
    Load,
    /// `document.readyState` is `interactive` or `complete`
    DomContentLoaded,
    /// Load plus a quiet window with no new network resources
    #[default]
    NetworkIdle,
}

impl FromStr for WaitUntil {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(Self::Load),
            "domcontentloaded" | "dom-ready" | "domready" => Ok(Self::DomContentLoaded),
            "networkidle" | "network-idle" => Ok(Self::NetworkIdle),
            other => Err(anyhow::anyhow!(
                "invalid wait condition '{other}': expected load, domcontentloaded or networkidle"
            )),
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
        })
    }
}

/// Post-navigation auto-scroll used to trigger lazy-loaded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub enabled: bool,
    pub steps: u32,
    pub delay_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            steps: DEFAULT_SCROLL_STEPS,
            delay_ms: DEFAULT_SCROLL_DELAY_MS,
        }
    }
}

/// Login form description as supplied by the caller.
///
/// Every field except `next_selector` and `post_login_selector` is required
/// once a login URL is given; [`CrawlConfigBuilder::build`] rejects an
/// incomplete form.
///
/// [`CrawlConfigBuilder::build`]: super::CrawlConfigBuilder
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginConfig {
    pub login_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub username_selector: Option<String>,
    pub next_selector: Option<String>,
    pub password_selector: Option<String>,
    pub submit_selector: Option<String>,
    pub post_login_selector: Option<String>,
}

impl LoginConfig {
    #[must_use]
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn username_selector(mut self, selector: impl Into<String>) -> Self {
        self.username_selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn next_selector(mut self, selector: impl Into<String>) -> Self {
        self.next_selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn password_selector(mut self, selector: impl Into<String>) -> Self {
        self.password_selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn submit_selector(mut self, selector: impl Into<String>) -> Self {
        self.submit_selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn post_login_selector(mut self, selector: impl Into<String>) -> Self {
        self.post_login_selector = Some(selector.into());
        self
    }
}

impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("username_selector", &self.username_selector)
            .field("next_selector", &self.next_selector)
            .field("password_selector", &self.password_selector)
            .field("submit_selector", &self.submit_selector)
            .field("post_login_selector", &self.post_login_selector)
            .finish()
    }
}

/// A login form that passed validation; all required parts are present.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginSteps {
    pub login_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub username_selector: String,
    pub next_selector: Option<String>,
    pub password_selector: String,
    pub submit_selector: String,
    pub post_login_selector: Option<String>,
}

impl fmt::Debug for LoginSteps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSteps")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("username_selector", &self.username_selector)
            .field("next_selector", &self.next_selector)
            .field("password_selector", &self.password_selector)
            .field("submit_selector", &self.submit_selector)
            .field("post_login_selector", &self.post_login_selector)
            .finish()
    }
}

/// Main configuration for a discovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Normalized start URL. Also defines the initial allowed origin.
    pub(crate) start_url: String,
    /// Where the YAML page listing is written.
    pub(crate) output_path: PathBuf,
    pub(crate) max_pages: usize,
    /// `None` means unbounded.
    pub(crate) max_depth: Option<u32>,
    pub(crate) timeout_secs: u64,
    /// Pause between consecutive fetches.
    pub(crate) delay: Duration,
    pub(crate) user_agent: String,
    pub(crate) keep_fragment: bool,
    pub(crate) max_bytes: usize,

    pub(crate) rendered: bool,
    pub(crate) wait_until: WaitUntil,
    pub(crate) headless: bool,
    pub(crate) ignore_https_errors: bool,
    pub(crate) scroll: ScrollConfig,
    pub(crate) login: Option<LoginSteps>,
    /// Cookie file loaded before the first navigation and rewritten after login.
    pub(crate) storage_state_path: Option<PathBuf>,

    /// Emit per-page element records instead of only a page listing.
    pub(crate) extract_elements: bool,
    /// Run the exploration pass during element extraction.
    pub(crate) explore: bool,
    pub(crate) safety_config_path: PathBuf,
    pub(crate) pages_dir: PathBuf,

    /// Chrome profile directory; a throwaway temp dir is used when unset.
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay: Duration::ZERO,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            keep_fragment: false,
            max_bytes: DEFAULT_MAX_BYTES,
            rendered: false,
            wait_until: WaitUntil::default(),
            headless: true,
            ignore_https_errors: false,
            scroll: ScrollConfig::default(),
            login: None,
            storage_state_path: None,
            extract_elements: false,
            explore: false,
            safety_config_path: PathBuf::from(DEFAULT_SAFETY_CONFIG),
            pages_dir: PathBuf::from(DEFAULT_PAGES_DIR),
            chrome_data_dir: None,
        }
    }
}

impl CrawlConfig {
    /// Use a specific Chrome profile directory instead of a temp dir.
    ///
    /// The directory is left in place at cleanup so a persistent profile
    /// survives across runs.
    #[must_use]
    pub fn with_chrome_data_dir(mut self, dir: PathBuf) -> Self {
        self.chrome_data_dir = Some(dir);
        self
    }
}
