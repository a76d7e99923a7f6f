//! Top-level discovery runs
//!
//! `crawl_impl` picks the fetch strategy from the configuration, runs the
//! crawl and, in extraction mode, collects the interactive elements of each
//! page. A rendered run uses one browser session for both phases and closes
//! it at the end whatever happened in between.

use anyhow::Context;
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::crawl_types::{CancelFlag, CrawlError, CrawlResult, Page};
use super::crawler::crawl_site;
use super::progress::ProgressReporter;
use crate::config::CrawlConfig;
use crate::exploration::{ExplorationPass, InteractiveSurface, SafetyPolicy, SessionSurface};
use crate::fetch::{
    ChromiumSession, FetchedContent, Fetcher, RenderedFetcher, RenderedSession, StaticFetcher,
    auto_scroll, load_storage_state, perform_login, save_storage_state,
};
use crate::output::{
    DEFAULT_PAGE_STEM, StemRegistry, UNTITLED_PAGE, page_file_stem, write_page_elements,
};
use crate::page_extractor::js_scripts::TITLE_SCRIPT;
use crate::page_extractor::{DomSnapshot, PageElements, extract_elements, extract_links};
use crate::utils::collapse_whitespace;

/// A page to extract elements from, optionally with its output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub url: String,
    pub name: Option<String>,
}

impl PageTarget {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn named(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: Some(name.into()),
        }
    }
}

impl From<&Page> for PageTarget {
    fn from(page: &Page) -> Self {
        Self::new(page.url.clone())
    }
}

/// One entry of a YAML target list: a bare URL or `{name, url}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Url(String),
    Named { url: String, name: Option<String> },
}

/// Parse an extraction target list.
///
/// `input` is a path to a `.yaml`/`.yml` list of URLs or `{name, url}`
/// mappings, a path to a text file with one URL per line (`#` starts a
/// comment), or otherwise a comma-separated list of URLs.
///
/// # Errors
///
/// Fails when a list file cannot be read or parsed, or when it names no URL.
pub fn load_targets(input: &str) -> anyhow::Result<Vec<PageTarget>> {
    let path = Path::new(input.trim());
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let targets: Vec<PageTarget> = if path.is_file() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if is_yaml {
            let entries: Vec<TargetEntry> = serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            entries
                .into_iter()
                .map(|entry| match entry {
                    TargetEntry::Url(url) => PageTarget::new(url.trim()),
                    TargetEntry::Named { url, name } => PageTarget {
                        url: url.trim().to_string(),
                        name: name.filter(|n| !n.trim().is_empty()),
                    },
                })
                .filter(|t| !t.url.is_empty())
                .collect()
        } else {
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(PageTarget::new)
                .collect()
        }
    } else {
        input
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(PageTarget::new)
            .collect()
    };

    if targets.is_empty() {
        anyhow::bail!("no URLs found in '{input}'");
    }
    Ok(targets)
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Crawled pages; empty when explicit targets replaced the crawl.
    pub pages: Vec<Page>,
    /// Element files written in extraction mode.
    pub element_files: Vec<PathBuf>,
}

/// Run a discovery as configured.
///
/// With `targets`, the crawl is skipped and only those pages are extracted.
/// Without them, the site is crawled and, in extraction mode, every crawled
/// page is extracted.
///
/// # Errors
///
/// Fails on configuration errors, when the browser cannot be launched, or
/// when an element file cannot be written. Per-page failures are skipped.
pub async fn crawl_impl<P: ProgressReporter + ?Sized>(
    config: &CrawlConfig,
    targets: Option<Vec<PageTarget>>,
    progress: &P,
    cancel: &CancelFlag,
) -> CrawlResult<Discovery> {
    if config.rendered() {
        let session = ChromiumSession::launch(config)
            .await
            .map_err(|e| CrawlError::Browser(format!("{e:#}")))?;
        let result = discover_rendered(&session, config, targets, progress, cancel).await;
        session.close().await.log();
        result
    } else {
        let mut fetcher = StaticFetcher::new(config).map_err(|e| CrawlError::Config(format!("{e:#}")))?;
        discover_static(&mut fetcher, config, targets, progress, cancel).await
    }
}

/// Rendered discovery over an already open session.
///
/// # Errors
///
/// See [`crawl_impl`].
pub async fn discover_rendered<S, P>(
    session: &S,
    config: &CrawlConfig,
    targets: Option<Vec<PageTarget>>,
    progress: &P,
    cancel: &CancelFlag,
) -> CrawlResult<Discovery>
where
    S: RenderedSession + ?Sized,
    P: ProgressReporter + ?Sized,
{
    prepare_session(session, config).await;

    let (pages, targets) = match targets {
        Some(targets) => (Vec::new(), targets),
        None => {
            let mut fetcher = RenderedFetcher::new(session, config);
            let pages = crawl_site(config, &mut fetcher, progress, cancel).await?;
            let targets = pages.iter().map(PageTarget::from).collect();
            (pages, targets)
        }
    };

    let element_files = if config.extract_elements() {
        extract_pages(session, config, &targets, cancel).await?
    } else {
        Vec::new()
    };

    Ok(Discovery {
        pages,
        element_files,
    })
}

/// Static discovery through any [`Fetcher`] that returns HTML.
///
/// # Errors
///
/// See [`crawl_impl`].
pub async fn discover_static<F, P>(
    fetcher: &mut F,
    config: &CrawlConfig,
    targets: Option<Vec<PageTarget>>,
    progress: &P,
    cancel: &CancelFlag,
) -> CrawlResult<Discovery>
where
    F: Fetcher + ?Sized,
    P: ProgressReporter + ?Sized,
{
    let (pages, targets) = match targets {
        Some(targets) => (Vec::new(), targets),
        None => {
            let pages = crawl_site(config, fetcher, progress, cancel).await?;
            let targets = pages.iter().map(PageTarget::from).collect();
            (pages, targets)
        }
    };

    let element_files = if config.extract_elements() {
        extract_pages_static(fetcher, config, &targets, cancel).await?
    } else {
        Vec::new()
    };

    Ok(Discovery {
        pages,
        element_files,
    })
}

/// Restore saved cookies, log in when configured and save the resulting
/// cookies. Every step is best-effort.
pub async fn prepare_session<S: RenderedSession + ?Sized>(session: &S, config: &CrawlConfig) {
    let state_path = config.storage_state_path();

    if let Some(path) = state_path.filter(|p| p.exists()) {
        match load_storage_state(path) {
            Ok(cookies) => match session.set_cookies(&cookies).await {
                Ok(()) => info!(
                    target: "sitescout::login",
                    "Restored {} cookies from {}",
                    cookies.len(),
                    path.display()
                ),
                Err(e) => warn!(target: "sitescout::login", "Failed to restore cookies: {e:#}"),
            },
            Err(e) => warn!(target: "sitescout::login", "Ignoring storage state: {e:#}"),
        }
    }

    let Some(login) = config.login() else {
        return;
    };
    perform_login(session, login, config.wait_until(), config.timeout()).await;

    if let Some(path) = state_path {
        let saved = async {
            let cookies = session.cookies().await?;
            save_storage_state(path, &cookies)?;
            anyhow::Ok(cookies.len())
        };
        match saved.await {
            Ok(count) => info!(
                target: "sitescout::login",
                "Saved {count} cookies to {}",
                path.display()
            ),
            Err(e) => warn!(target: "sitescout::login", "Failed to save storage state: {e:#}"),
        }
    }
}

/// Extract every target in the rendered session and write one JSON file
/// per page. Returns the written paths.
///
/// # Errors
///
/// Fails only when an element file cannot be written.
pub async fn extract_pages<S: RenderedSession + ?Sized>(
    session: &S,
    config: &CrawlConfig,
    targets: &[PageTarget],
    cancel: &CancelFlag,
) -> CrawlResult<Vec<PathBuf>> {
    let policy = config
        .explore()
        .then(|| SafetyPolicy::load(config.safety_config_path()));
    let surface = SessionSurface::new(session);

    let mut stems = StemRegistry::new();
    let mut written = Vec::new();

    for (i, target) in targets.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(target: "sitescout::elements", "Extraction cancelled after {} pages", written.len());
            break;
        }
        if i > 0 && !config.delay().is_zero() {
            tokio::time::sleep(config.delay()).await;
        }

        info!(target: "sitescout::elements", "Extracting {}", target.url);
        match extract_rendered_target(session, &surface, config, target, policy.as_ref()).await {
            Ok(record) => written.push(save_record(config, &mut stems, target, &record).await?),
            Err(e) => warn!(target: "sitescout::elements", "Skipping {}: {e:#}", target.url),
        }
    }

    Ok(written)
}

async fn extract_rendered_target<S, T>(
    session: &S,
    surface: &T,
    config: &CrawlConfig,
    target: &PageTarget,
    policy: Option<&SafetyPolicy>,
) -> anyhow::Result<PageElements>
where
    S: RenderedSession + ?Sized,
    T: InteractiveSurface + ?Sized,
{
    session
        .navigate(&target.url, config.wait_until(), config.timeout())
        .await?;
    auto_scroll(session, config.scroll(), config.timeout()).await;

    let title = session
        .evaluate(TITLE_SCRIPT)
        .await?
        .as_str()
        .map(collapse_whitespace)
        .unwrap_or_default();

    let snapshot = surface.snapshot().await?;
    let mut elements = extract_elements(&snapshot);
    info!(
        target: "sitescout::elements",
        "Found {} elements on {}",
        elements.len(),
        target.url
    );

    if let Some(policy) = policy {
        let revealed = ExplorationPass::new(policy).run(surface, &elements).await;
        elements.extend(revealed);
    }

    Ok(PageElements {
        url: target.url.clone(),
        title,
        elements,
    })
}

/// Extract every target from static HTML. Exploration needs a live page and
/// is skipped here.
///
/// # Errors
///
/// Fails only when an element file cannot be written.
pub async fn extract_pages_static<F: Fetcher + ?Sized>(
    fetcher: &mut F,
    config: &CrawlConfig,
    targets: &[PageTarget],
    cancel: &CancelFlag,
) -> CrawlResult<Vec<PathBuf>> {
    if config.explore() {
        warn!(
            target: "sitescout::explore",
            "Exploration needs rendered mode; extracting static markup only"
        );
    }

    let mut stems = StemRegistry::new();
    let mut written = Vec::new();

    for (i, target) in targets.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(target: "sitescout::elements", "Extraction cancelled after {} pages", written.len());
            break;
        }
        if i > 0 && !config.delay().is_zero() {
            tokio::time::sleep(config.delay()).await;
        }

        match extract_static_target(fetcher, target).await {
            Ok(record) => written.push(save_record(config, &mut stems, target, &record).await?),
            Err(e) => warn!(target: "sitescout::elements", "Skipping {}: {e:#}", target.url),
        }
    }

    Ok(written)
}

async fn extract_static_target<F: Fetcher + ?Sized>(
    fetcher: &mut F,
    target: &PageTarget,
) -> anyhow::Result<PageElements> {
    let result = fetcher.fetch(&target.url).await?;
    if !result.is_html() {
        anyhow::bail!(
            "non-HTML content type {}",
            result.content_type.unwrap_or_default()
        );
    }
    let FetchedContent::Html(html) = result.content else {
        anyhow::bail!("fetcher returned no markup");
    };

    let title = extract_links(&html)?.title;
    let elements = extract_elements(&DomSnapshot::from_html(&html));
    info!(
        target: "sitescout::elements",
        "Found {} elements on {}",
        elements.len(),
        target.url
    );

    Ok(PageElements {
        url: target.url.clone(),
        title,
        elements,
    })
}

async fn save_record(
    config: &CrawlConfig,
    stems: &mut StemRegistry,
    target: &PageTarget,
    record: &PageElements,
) -> CrawlResult<PathBuf> {
    let fallback = if config.explore() {
        DEFAULT_PAGE_STEM
    } else {
        UNTITLED_PAGE
    };
    let stem = stems.claim(&page_file_stem(target.name.as_deref(), &record.title, fallback));
    let path = write_page_elements(config.pages_dir(), &stem, record)
        .await
        .map_err(|e| CrawlError::Output(format!("{e:#}")))?;
    info!(
        target: "sitescout::elements",
        "Saved {} elements to {}",
        record.elements.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_targets() {
        let targets = load_targets("https://a.example/, https://a.example/x,,").unwrap();
        assert_eq!(
            targets,
            [PageTarget::new("https://a.example/"), PageTarget::new("https://a.example/x")]
        );
    }

    #[test]
    fn yaml_target_list_keeps_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.yaml");
        std::fs::write(
            &path,
            "- name: Login\n  url: https://a.example/login\n- https://a.example/home\n- url: https://a.example/x\n",
        )
        .unwrap();

        let targets = load_targets(path.to_str().unwrap()).unwrap();
        assert_eq!(
            targets,
            [
                PageTarget::named("https://a.example/login", "Login"),
                PageTarget::new("https://a.example/home"),
                PageTarget::new("https://a.example/x"),
            ]
        );
    }

    #[test]
    fn text_target_list_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "# pages\nhttps://a.example/\n\n  https://a.example/y  \n").unwrap();
        let targets = load_targets(path.to_str().unwrap()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].url, "https://a.example/y");
    }

    #[test]
    fn empty_list_is_an_error() {
        assert!(load_targets(" , ").is_err());
    }
}
