//! Crawl Engine Module
//!
//! The breadth-first traversal, its frontier and origin gate, the top-level
//! discovery runs and the supporting timeout, progress and cleanup helpers.

// Sub-modules
pub mod cleanup;
pub mod crawl_types;
pub mod crawler;
pub mod execution;
pub mod frontier;
pub mod origin_gate;
pub mod page_timeout;
pub mod progress;

// Re-exports for public API
pub use cleanup::CleanupResult;
pub use crawl_types::{CancelFlag, CrawlError, CrawlQueue, CrawlResult, Page};
pub use crawler::crawl_site;
pub use execution::{
    Discovery, PageTarget, crawl_impl, discover_rendered, discover_static, extract_pages,
    extract_pages_static, load_targets, prepare_session,
};
pub use frontier::Frontier;
pub use origin_gate::SameOriginGate;
pub use progress::{LogProgress, NoOpProgress, ProgressReporter, SkipReason};
