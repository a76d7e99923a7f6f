//! Breadth-first site traversal.
//!
//! One fetch completes before the next frontier entry is dequeued. Every
//! per-URL failure is reported through the [`ProgressReporter`] and skipped;
//! only an invalid start URL aborts the crawl.

use log::{debug, info};

use super::crawl_types::{CancelFlag, CrawlError, CrawlResult, Page};
use super::frontier::Frontier;
use super::origin_gate::SameOriginGate;
use super::progress::{ProgressReporter, SkipReason};
use crate::config::CrawlConfig;
use crate::fetch::{FetchedContent, Fetcher, RenderedLink};
use crate::page_extractor::{accept_href, extract_links, resolve_static_links};
use crate::utils::{collapse_whitespace, normalize_url, resolve_href};

/// Crawl from the configured start URL and return the pages in the order
/// they were recorded.
///
/// Stops when the frontier is empty, when `max_pages` pages were recorded,
/// or when `cancel` is set. A cancelled crawl still returns what it has.
///
/// # Errors
///
/// Returns [`CrawlError::Config`] when the start URL has no host.
pub async fn crawl_site<F, P>(
    config: &CrawlConfig,
    fetcher: &mut F,
    progress: &P,
    cancel: &CancelFlag,
) -> CrawlResult<Vec<Page>>
where
    F: Fetcher + ?Sized,
    P: ProgressReporter + ?Sized,
{
    let start = config.start_url();
    let mut gate = SameOriginGate::new(start)
        .ok_or_else(|| CrawlError::Config(format!("start URL '{start}' has no host")))?;
    let keep_fragment = config.keep_fragment();

    let mut frontier = Frontier::new(config.max_pages(), config.max_depth());
    frontier.enqueue(start, 0);

    let mut pages: Vec<Page> = Vec::new();
    let mut fetches = 0usize;

    while let Some(entry) = frontier.dequeue() {
        if cancel.is_cancelled() {
            info!(
                target: "sitescout::crawl",
                "Crawl cancelled with {} pages recorded",
                pages.len()
            );
            break;
        }

        if fetches > 0 && !config.delay().is_zero() {
            tokio::time::sleep(config.delay()).await;
        }
        let first_fetch = fetches == 0;
        fetches += 1;

        progress.report_fetch_started(&entry.url, entry.depth);
        let result = match fetcher.fetch(&entry.url).await {
            Ok(result) => result,
            Err(e) => {
                progress.report_skipped(&entry.url, &SkipReason::FetchFailed(e.to_string()));
                continue;
            }
        };

        let Some(effective) = normalize_url(&result.final_url, keep_fragment) else {
            progress.report_skipped(
                &entry.url,
                &SkipReason::FetchFailed(format!("unusable final URL {}", result.final_url)),
            );
            continue;
        };

        if !gate.admit_fetched(&effective, first_fetch, frontier.recorded()) {
            progress.report_skipped(&entry.url, &SkipReason::CrossOrigin(effective));
            continue;
        }

        if effective != entry.url && !frontier.mark_seen(&effective) {
            progress.report_skipped(&entry.url, &SkipReason::Duplicate(effective));
            continue;
        }

        if !result.is_html() {
            let content_type = result.content_type.unwrap_or_default();
            progress.report_skipped(&effective, &SkipReason::NotHtml(content_type));
            continue;
        }

        let (title, links) = match result.content {
            FetchedContent::Html(html) => match extract_links(&html) {
                Ok(extraction) => {
                    let links = resolve_static_links(&effective, &extraction, keep_fragment);
                    (extraction.title, links)
                }
                Err(e) => {
                    progress.report_skipped(&effective, &SkipReason::ParseFailed(format!("{e:#}")));
                    continue;
                }
            },
            FetchedContent::Live { title, links } => (
                collapse_whitespace(&title),
                resolve_rendered_links(&effective, &links, keep_fragment),
            ),
        };

        let page = Page {
            url: effective,
            title,
        };
        frontier.record_page();
        progress.report_page_recorded(&page, frontier.recorded());

        let next_depth = entry.depth + 1;
        let mut queued = 0usize;
        for link in links {
            if gate.allows(&link) && frontier.enqueue(&link, next_depth) {
                queued += 1;
            }
        }
        debug!(
            target: "sitescout::crawl",
            "{} queued {queued} new links ({} pending)",
            page.url,
            frontier.pending()
        );

        pages.push(page);
    }

    if frontier.budget_spent() {
        info!(
            target: "sitescout::crawl",
            "Reached page limit of {}",
            config.max_pages()
        );
    } else if !cancel.is_cancelled() {
        info!(target: "sitescout::crawl", "Frontier exhausted");
    }
    progress.report_completed(pages.len());

    Ok(pages)
}

/// Filter and normalize links read from a live DOM. The browser-resolved
/// `abs` wins; `raw` is resolved against the page only when it is missing.
fn resolve_rendered_links(page_url: &str, links: &[RenderedLink], keep_fragment: bool) -> Vec<String> {
    links
        .iter()
        .filter(|link| {
            let raw = link.raw.trim();
            raw != "#" && accept_href(raw, keep_fragment)
        })
        .filter_map(|link| match link.abs.as_deref().map(str::trim) {
            Some(abs) if !abs.is_empty() => normalize_url(abs, keep_fragment),
            _ => resolve_href(page_url, link.raw.trim(), keep_fragment),
        })
        .collect()
}
