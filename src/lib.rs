pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod exploration;
pub mod fetch;
pub mod output;
pub mod page_extractor;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{CrawlConfig, LoginConfig, WaitUntil};
pub use crawl_engine::{
    CancelFlag, CrawlError, CrawlResult, Discovery, LogProgress, NoOpProgress, Page, PageTarget,
    ProgressReporter, crawl_impl, crawl_site,
};
pub use exploration::{ExplorationPass, SafetyPolicy};
pub use fetch::{FetchError, FetchResult, Fetcher, RenderedSession};
pub use page_extractor::schema::*;
pub use utils::normalize_url;

/// Crawl as configured and return the recorded pages, without element
/// extraction and with progress going to the log.
///
/// # Errors
///
/// See [`crawl_impl`].
pub async fn crawl(config: &CrawlConfig) -> Result<Vec<Page>, CrawlError> {
    let config = CrawlConfig {
        extract_elements: false,
        ..config.clone()
    };
    let discovery = crawl_impl(&config, None, &LogProgress, &CancelFlag::new()).await?;
    Ok(discovery.pages)
}
