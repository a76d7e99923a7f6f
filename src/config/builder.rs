//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! The output path and the start URL must be supplied, in that order, before
//! `build()` becomes available. Everything else has a default.

use anyhow::{Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{CrawlConfig, LoginConfig, LoginSteps};
use crate::utils::normalize_url;

// Type states for the builder
pub struct WithOutputPath;
pub struct WithStartUrl;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) draft: CrawlConfig,
    pub(crate) raw_start_url: Option<String>,
    pub(crate) login: Option<LoginConfig>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            draft: CrawlConfig::default(),
            raw_start_url: None,
            login: None,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl CrawlConfigBuilder<()> {
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> CrawlConfigBuilder<WithOutputPath> {
        self.draft.output_path = path.into();
        CrawlConfigBuilder {
            draft: self.draft,
            raw_start_url: self.raw_start_url,
            login: self.login,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<WithOutputPath> {
    pub fn start_url(self, url: impl Into<String>) -> CrawlConfigBuilder<WithStartUrl> {
        let url_string = url.into().trim().to_string();

        // A bare host gets https:// so "example.com" is accepted
        let with_scheme = if url_string.contains("://") || url_string.is_empty() {
            url_string
        } else {
            format!("https://{url_string}")
        };

        CrawlConfigBuilder {
            draft: self.draft,
            raw_start_url: Some(with_scheme),
            login: self.login,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl CrawlConfigBuilder<WithStartUrl> {
    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Fails when the start URL does not normalize to an http(s) URL with a
    /// host, when `max_pages` is zero, or when a login URL was given without
    /// every required credential and selector.
    pub fn build(self) -> Result<CrawlConfig> {
        let raw = self
            .raw_start_url
            .ok_or_else(|| anyhow!("start_url is required"))?;
        let start_url = normalize_url(&raw, self.draft.keep_fragment)
            .ok_or_else(|| anyhow!("invalid start URL '{raw}': expected an http(s) URL with a host"))?;

        if self.draft.max_pages == 0 {
            return Err(anyhow!("max_pages must be at least 1"));
        }

        let login = self.login.map(validate_login).transpose()?;
        // Login needs a browser session
        let rendered = self.draft.rendered || login.is_some();

        Ok(CrawlConfig {
            start_url,
            login,
            rendered,
            ..self.draft
        })
    }
}

fn validate_login(login: LoginConfig) -> Result<LoginSteps> {
    let mut missing = Vec::new();
    let mut require = |value: Option<String>, name: &'static str| -> String {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => {
                missing.push(name);
                String::new()
            }
        }
    };

    let login_url = require(Some(login.login_url), "login_url");
    let username = require(login.username, "username");
    let password = require(login.password, "password");
    let username_selector = require(login.username_selector, "username_selector");
    let password_selector = require(login.password_selector, "password_selector");
    let submit_selector = require(login.submit_selector, "submit_selector");

    if !missing.is_empty() {
        return Err(anyhow!(
            "login requires the following missing values: {}",
            missing.join(", ")
        ));
    }

    if normalize_url(&login_url, true).is_none() {
        return Err(anyhow!("invalid login URL '{login_url}'"));
    }

    Ok(LoginSteps {
        login_url,
        username,
        password,
        username_selector,
        next_selector: login.next_selector.filter(|s| !s.trim().is_empty()),
        password_selector,
        submit_selector,
        post_login_selector: login.post_login_selector.filter(|s| !s.trim().is_empty()),
    })
}
