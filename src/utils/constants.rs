//! Shared defaults for sitescout
//!
//! Default values used by the config builder, the fetchers and the CLI so the
//! same numbers are not repeated across the codebase.

/// Default User-Agent sent by the static fetcher.
pub const DEFAULT_USER_AGENT: &str = "SimpleSiteCrawler/1.0";

/// Accept header sent with every static fetch.
pub const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Default maximum number of recorded pages.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Default per-fetch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Hard cap on bytes read from a single static response: 2 MiB.
pub const DEFAULT_MAX_BYTES: usize = 2 * 1024 * 1024;

/// How many leading bytes are scanned for a `charset=` declaration.
pub const CHARSET_SNIFF_BYTES: usize = 4096;

/// Auto-scroll defaults for rendered sessions.
pub const DEFAULT_SCROLL_STEPS: u32 = 6;
pub const DEFAULT_SCROLL_DELAY_MS: u64 = 250;

/// Maximum characters kept from an element's text content.
pub const ELEMENT_TEXT_LIMIT: usize = 50;

/// Fallback element name when no text or identifying attribute exists.
pub const UNNAMED_ELEMENT: &str = "Unnamed Element";

/// Attribute that marks an element as ignored by extraction.
pub const IGNORE_ATTRIBUTE: &str = "data-crawler-ignore";

/// Exploration timings.
pub const TRIGGER_CLICK_TIMEOUT_MS: u64 = 1000;
pub const EXPLORATION_SETTLE_MS: u64 = 500;

/// Quiet window used to decide that the network went idle.
pub const NETWORK_IDLE_WINDOW_MS: u64 = 500;

/// Default safety configuration file.
pub const DEFAULT_SAFETY_CONFIG: &str = "crawler_config.yaml";

/// Default output file for the page listing.
pub const DEFAULT_OUTPUT_PATH: &str = "site.yaml";

/// Default directory for per-page element files.
pub const DEFAULT_PAGES_DIR: &str = "pages";
