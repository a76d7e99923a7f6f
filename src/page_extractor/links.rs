//! Title and link extraction.
//!
//! Static documents are streamed through `lol_html` without building a tree;
//! rendered documents are read with [`super::js_scripts::LINKS_SCRIPT`]. Both
//! paths share the href filter and resolution helpers below.

use lol_html::{HtmlRewriter, OutputSink, Settings, element, text};

use crate::utils::{collapse_whitespace, resolve_href};

/// What a static document says about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkExtraction {
    /// Whitespace-collapsed `<title>` text.
    pub title: String,
    /// First non-empty `<base href>`, verbatim.
    pub base_href: Option<String>,
    /// Every non-empty `<a href>`, verbatim and in document order.
    pub hrefs: Vec<String>,
}

struct NoopSink;

impl OutputSink for NoopSink {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

/// Stream `html` once and collect its title, base href and anchor hrefs.
///
/// # Errors
///
/// Returns the rewriter error when the document cannot be tokenized.
pub fn extract_links(html: &str) -> anyhow::Result<LinkExtraction> {
    let mut base_href: Option<String> = None;
    let mut hrefs: Vec<String> = Vec::new();
    let mut title_parts = String::new();

    {
        let base_handler = element!("base[href]", |el| {
            if base_href.is_none()
                && let Some(href) = el.get_attribute("href")
            {
                let href = decode_attribute(&href);
                if !href.is_empty() {
                    base_href = Some(href);
                }
            }
            Ok(())
        });

        let anchor_handler = element!("a[href]", |el| {
            if let Some(href) = el.get_attribute("href") {
                let href = decode_attribute(&href);
                if !href.is_empty() {
                    hrefs.push(href);
                }
            }
            Ok(())
        });

        // Title text may arrive split across several chunks
        let title_handler = text!("title", |chunk| {
            title_parts.push_str(chunk.as_str());
            Ok(())
        });

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![base_handler, anchor_handler, title_handler],
                ..Settings::new()
            },
            NoopSink,
        );
        rewriter.write(html.as_bytes())?;
        rewriter.end()?;
    }

    let title = collapse_whitespace(&html_escape::decode_html_entities(&title_parts));

    Ok(LinkExtraction {
        title,
        base_href,
        hrefs,
    })
}

fn decode_attribute(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}

/// Href filter applied before resolution.
///
/// Drops empty values, `javascript:`, `mailto:`, `tel:` and `data:` links,
/// and fragment-only links unless fragments are kept.
#[must_use]
pub fn accept_href(href: &str, keep_fragment: bool) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }
    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return false;
    }
    !(href.starts_with('#') && !keep_fragment)
}

/// Base for resolving relative links: the `<base href>` resolved against the
/// page URL when present, otherwise the page URL itself.
#[must_use]
pub fn link_base(page_url: &str, base_href: Option<&str>) -> String {
    base_href
        .and_then(|base| resolve_href(page_url, base, false))
        .unwrap_or_else(|| page_url.to_string())
}

/// Filter, resolve and normalize the hrefs of a static document.
#[must_use]
pub fn resolve_static_links(page_url: &str, extraction: &LinkExtraction, keep_fragment: bool) -> Vec<String> {
    let base = link_base(page_url, extraction.base_href.as_deref());
    extraction
        .hrefs
        .iter()
        .filter(|href| accept_href(href, keep_fragment))
        .filter_map(|href| resolve_href(&base, href, keep_fragment))
        .collect()
}
