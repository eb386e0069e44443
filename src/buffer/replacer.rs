use lru::LruCache;
use std::collections::VecDeque;

use crate::file::PageId;

/// Eviction policy over the pages resident in the buffer pool
///
/// The pool reports every hit and load through `record_access` and every
/// removal through `remove`, so the replacer tracks exactly the resident set.
pub trait Replacer: Send {
    fn record_access(&mut self, page_id: PageId);

    fn remove(&mut self, page_id: PageId);

    /// Resident pages in the order they should be tried as victims
    fn candidates(&self) -> Vec<PageId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Least-recently-used order; the default policy
pub struct LruReplacer {
    recency: LruCache<PageId, ()>,
}

impl LruReplacer {
    pub fn new() -> Self {
        Self {
            recency: LruCache::unbounded(),
        }
    }
}

impl Default for LruReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, page_id: PageId) {
        // put promotes an existing key to most recent
        self.recency.put(page_id, ());
    }

    fn remove(&mut self, page_id: PageId) {
        self.recency.pop(&page_id);
    }

    fn candidates(&self) -> Vec<PageId> {
        self.recency.iter().rev().map(|(page_id, _)| *page_id).collect()
    }

    fn len(&self) -> usize {
        self.recency.len()
    }
}

/// Load order; hits do not change a page's position
#[derive(Default)]
pub struct FifoReplacer {
    queue: VecDeque<PageId>,
}

impl FifoReplacer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Replacer for FifoReplacer {
    fn record_access(&mut self, page_id: PageId) {
        if !self.queue.contains(&page_id) {
            self.queue.push_back(page_id);
        }
    }

    fn remove(&mut self, page_id: PageId) {
        self.queue.retain(|p| *p != page_id);
    }

    fn candidates(&self) -> Vec<PageId> {
        self.queue.iter().copied().collect()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
