//! Page data extraction.
//!
//! Link extraction for the crawl loop, and the snapshot-based element
//! pipeline used in extraction mode: structural deduplication first, then
//! element collection.

pub mod dedup;
pub mod elements;
pub mod js_scripts;
pub mod links;
pub mod schema;
pub mod snapshot;

pub use dedup::StructuralDeduplicator;
pub use elements::{ElementExtractor, dedupe_elements};
pub use links::{LinkExtraction, accept_href, extract_links, link_base, resolve_static_links};
pub use schema::{Element, ElementSignature, ElementTag, PageElements};
pub use snapshot::{DomSnapshot, SnapshotNode};

/// Run deduplication and extraction over a snapshot.
#[must_use]
pub fn extract_elements(snapshot: &DomSnapshot) -> Vec<Element> {
    let excluded = StructuralDeduplicator::excluded(snapshot);
    ElementExtractor::new(snapshot, &excluded).extract()
}
