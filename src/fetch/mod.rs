//! Fetch adapters.
//!
//! Both strategies sit behind [`Fetcher`]: [`StaticFetcher`] issues one HTTP
//! GET per URL, [`RenderedFetcher`] drives a persistent browser tab. The crawl
//! loop only sees [`FetchResult`] and [`FetchError`].

use async_trait::async_trait;
use thiserror::Error;

pub mod charset;
pub mod login;
pub mod rendered;
pub mod session;
pub mod static_fetch;
pub mod storage_state;

pub use login::{LoginOutcome, LoginStep, perform_login};
pub use rendered::{RenderedFetcher, auto_scroll};
pub use session::{ChromiumSession, RenderedSession};
pub use static_fetch::StaticFetcher;
pub use storage_state::{StoredCookie, load_storage_state, save_storage_state};

/// A fetch that did not produce a response. Always a transient skip.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// One link read from a live DOM.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RenderedLink {
    /// The `href` attribute as written.
    pub raw: String,
    /// The href resolved against `document.baseURI` at query time.
    #[serde(default)]
    pub abs: Option<String>,
}

/// Page content in the form the strategy produced it.
#[derive(Debug, Clone)]
pub enum FetchedContent {
    /// Decoded document text from a static fetch.
    Html(String),
    /// Title and links already read from the rendered document.
    Live {
        title: String,
        links: Vec<RenderedLink>,
    },
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL after redirects, not yet normalized.
    pub final_url: String,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub content: FetchedContent,
}

impl FetchResult {
    /// Content-type gate: accept when no type was declared or the MIME type
    /// mentions `html`.
    #[must_use]
    pub fn is_html(&self) -> bool {
        is_html_content_type(self.content_type.as_deref())
    }
}

/// `true` for a missing/empty content type or one whose MIME part contains `html`.
#[must_use]
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type.map(str::trim).filter(|ct| !ct.is_empty()) else {
        return true;
    };
    let lowered = content_type.to_ascii_lowercase();
    let mime = lowered.split(';').next().unwrap_or_default().trim();
    mime.contains("html")
}

/// Capability shared by both fetch strategies.
#[async_trait]
pub trait Fetcher: Send {
    /// Fetch `url`, following redirects, and report where it landed.
    async fn fetch(&mut self, url: &str) -> Result<FetchResult, FetchError>;
}
