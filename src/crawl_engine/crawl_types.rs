//! Core types for crawl operations.
//!
//! Error taxonomy, the `Page` record handed to callers, the frontier entry
//! and the cooperative cancellation flag.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Error type for crawl operations
///
/// Only `Config` is raised before any fetch; per-URL failures never surface
/// here because the crawl loop logs and skips them.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Invalid configuration, detected before the first fetch
    #[error("Configuration error: {0}")]
    Config(String),
    /// Browser could not be launched or the session broke down
    #[error("Browser error: {0}")]
    Browser(String),
    /// Output could not be written
    #[error("Output error: {0}")]
    Output(String),
    /// Other errors
    #[error("Crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain on one line
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// A successfully fetched, accepted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Normalized effective URL, after redirects.
    pub url: String,
    /// Whitespace-collapsed `<title>` text, possibly empty.
    pub title: String,
}

/// One frontier entry: a normalized URL and its link depth from the start page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlQueue {
    pub url: String,
    pub depth: u32,
}

/// Cooperative cancellation shared between the crawl loop and whoever
/// decides to stop it (typically a Ctrl-C handler).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
