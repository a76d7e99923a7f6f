//! Breadth-first frontier with a write-once seen set.
//!
//! The frontier owns both the FIFO queue and the set of every URL that was
//! ever admitted. A URL enters the seen set before it can be fetched and is
//! never removed, so no normalized URL is dequeued twice.

use std::collections::{HashSet, VecDeque};

use super::crawl_types::CrawlQueue;

#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlQueue>,
    seen: HashSet<String>,
    recorded: usize,
    max_pages: usize,
    max_depth: Option<u32>,
}

impl Frontier {
    #[must_use]
    pub fn new(max_pages: usize, max_depth: Option<u32>) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            recorded: 0,
            max_pages,
            max_depth,
        }
    }

    /// Admit `url` at `depth`.
    ///
    /// No-op when the URL was already seen, when `depth` exceeds the depth
    /// bound, or when the page budget is already spent. Returns whether the
    /// entry was queued.
    pub fn enqueue(&mut self, url: &str, depth: u32) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        if self.max_depth.is_some_and(|max| depth > max) {
            return false;
        }
        if self.recorded >= self.max_pages {
            return false;
        }
        self.seen.insert(url.to_string());
        self.queue.push_back(CrawlQueue {
            url: url.to_string(),
            depth,
        });
        true
    }

    /// Next entry in FIFO order, or `None` once the queue is drained or the
    /// page budget is spent.
    pub fn dequeue(&mut self) -> Option<CrawlQueue> {
        if self.is_done() {
            return None;
        }
        self.queue.pop_front()
    }

    /// Record a redirect target or other alias so it is never fetched on its
    /// own. Returns `false` when it was already known.
    pub fn mark_seen(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    #[must_use]
    pub fn is_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Count one accepted page against the budget.
    pub fn record_page(&mut self) {
        self.recorded += 1;
    }

    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    #[must_use]
    pub fn budget_spent(&self) -> bool {
        self.recorded >= self.max_pages
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.queue.is_empty() || self.budget_spent()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
