//! Progress reporting abstraction for crawl operations
//!
//! The crawl loop calls a `ProgressReporter` at each lifecycle event instead
//! of reaching for any global state. Callers pick `NoOpProgress`,
//! `LogProgress`, or their own implementation.

use log::{debug, info, warn};

use super::crawl_types::Page;

/// Why a dequeued URL did not become a `Page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Timeout, network failure or navigation error
    FetchFailed(String),
    /// Response declared a non-HTML MIME type
    NotHtml(String),
    /// Effective URL left the allowed origin
    CrossOrigin(String),
    /// The document could not be parsed
    ParseFailed(String),
    /// Redirected onto a URL that was already seen
    Duplicate(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            Self::NotHtml(ct) => write!(f, "non-HTML content type {ct}"),
            Self::CrossOrigin(url) => write!(f, "redirected off-origin to {url}"),
            Self::ParseFailed(e) => write!(f, "parse failed: {e}"),
            Self::Duplicate(url) => write!(f, "redirected to already seen {url}"),
        }
    }
}

/// Trait for reporting crawl progress at key lifecycle events
pub trait ProgressReporter: Send + Sync {
    /// A fetch for `url` at `depth` is about to start
    fn report_fetch_started(&self, url: &str, depth: u32);

    /// A page was accepted; `recorded` is the running total
    fn report_page_recorded(&self, page: &Page, recorded: usize);

    /// A dequeued URL was abandoned
    fn report_skipped(&self, url: &str, reason: &SkipReason);

    /// Traversal ended normally
    fn report_completed(&self, recorded: usize);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_fetch_started(&self, _url: &str, _depth: u32) {}

    #[inline(always)]
    fn report_page_recorded(&self, _page: &Page, _recorded: usize) {}

    #[inline(always)]
    fn report_skipped(&self, _url: &str, _reason: &SkipReason) {}

    #[inline(always)]
    fn report_completed(&self, _recorded: usize) {}
}

/// Progress reporter that forwards every event to the `log` facade
#[derive(Debug, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_fetch_started(&self, url: &str, depth: u32) {
        debug!(target: "sitescout::crawl", "Fetching {url} (depth {depth})");
    }

    fn report_page_recorded(&self, page: &Page, recorded: usize) {
        info!(target: "sitescout::crawl", "[{recorded}] {} - {}", page.url, page.title);
    }

    fn report_skipped(&self, url: &str, reason: &SkipReason) {
        match reason {
            SkipReason::FetchFailed(_) | SkipReason::ParseFailed(_) => {
                warn!(target: "sitescout::crawl", "Skipping {url}: {reason}");
            }
            SkipReason::NotHtml(_) | SkipReason::CrossOrigin(_) | SkipReason::Duplicate(_) => {
                info!(target: "sitescout::crawl", "Skipping {url}: {reason}");
            }
        }
    }

    fn report_completed(&self, recorded: usize) {
        info!(target: "sitescout::crawl", "Crawl finished with {recorded} pages");
    }
}
