//! Getter methods for `CrawlConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{CrawlConfig, LoginSteps, ScrollConfig, WaitUntil};

impl CrawlConfig {
    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// `None` when depth is unbounded.
    #[must_use]
    pub fn max_depth(&self) -> Option<u32> {
        self.max_depth
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn keep_fragment(&self) -> bool {
        self.keep_fragment
    }

    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    #[must_use]
    pub fn rendered(&self) -> bool {
        self.rendered
    }

    #[must_use]
    pub fn wait_until(&self) -> WaitUntil {
        self.wait_until
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn ignore_https_errors(&self) -> bool {
        self.ignore_https_errors
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollConfig {
        self.scroll
    }

    #[must_use]
    pub fn login(&self) -> Option<&LoginSteps> {
        self.login.as_ref()
    }

    #[must_use]
    pub fn storage_state_path(&self) -> Option<&Path> {
        self.storage_state_path.as_deref()
    }

    #[must_use]
    pub fn extract_elements(&self) -> bool {
        self.extract_elements
    }

    #[must_use]
    pub fn explore(&self) -> bool {
        self.explore
    }

    #[must_use]
    pub fn safety_config_path(&self) -> &Path {
        &self.safety_config_path
    }

    #[must_use]
    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }
}
