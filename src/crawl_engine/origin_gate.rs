//! Same-origin gate.
//!
//! The allowed origin is the `host[:port]` of the normalized start URL. It may
//! move exactly once: when the very first fetch lands somewhere else (bare
//! domain to `www.`, for instance) before any page was recorded.

use log::{debug, info};

use crate::utils::netloc;

#[derive(Debug, Clone)]
pub struct SameOriginGate {
    origin: String,
    adopted: bool,
}

impl SameOriginGate {
    /// Build the gate from the normalized start URL. `None` if it has no host.
    #[must_use]
    pub fn new(start_url: &str) -> Option<Self> {
        Some(Self {
            origin: netloc(start_url)?,
            adopted: false,
        })
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether a candidate link stays on the allowed origin.
    #[must_use]
    pub fn allows(&self, url: &str) -> bool {
        netloc(url).is_some_and(|n| n == self.origin)
    }

    /// Check the effective URL of a completed fetch.
    ///
    /// Adopts the new origin when this is the first fetch and nothing was
    /// recorded yet; otherwise a foreign origin rejects the page.
    pub fn admit_fetched(&mut self, effective_url: &str, first_fetch: bool, recorded: usize) -> bool {
        let Some(effective) = netloc(effective_url) else {
            return false;
        };
        if effective == self.origin {
            return true;
        }
        if first_fetch && recorded == 0 && !self.adopted {
            info!(
                target: "sitescout::crawl",
                "Start URL redirected from {} to {effective}; adopting new origin",
                self.origin
            );
            self.origin = effective;
            self.adopted = true;
            return true;
        }
        debug!(
            target: "sitescout::crawl",
            "Rejecting {effective_url}: origin {effective} differs from {}",
            self.origin
        );
        false
    }
}
