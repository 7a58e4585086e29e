//! In-memory store for exactly one page of search results.
//!
//! Holding a single page at a time is the memory-bounding policy of the whole
//! client: `replace` drops the previous page wholesale, so long batch runs
//! across hundreds of pages never accumulate result data.

use crate::core::history::HistoryStore;
use crate::core::models::{ResultPage, VideoItem};

pub struct PageStore {
    page: ResultPage,
    per_page: usize,
}

impl PageStore {
    /// `per_page` is the page size requested from the API; the
    /// more-pages heuristic compares against it.
    pub fn new(per_page: usize) -> Self {
        Self {
            page: ResultPage::default(),
            per_page,
        }
    }

    /// Swap in a new page. The previous page is unreachable once this
    /// returns.
    pub fn replace(&mut self, items: Vec<VideoItem>, page_number: u32) {
        self.page = ResultPage { page_number, items };
    }

    pub fn current(&self) -> &ResultPage {
        &self.page
    }

    pub fn page_number(&self) -> u32 {
        self.page.page_number
    }

    pub fn len(&self) -> usize {
        self.page.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.items.is_empty()
    }

    /// Heuristic: a page filled to the requested size probably has a
    /// successor. The API does not expose an authoritative total, so false
    /// positives and negatives are accepted.
    pub fn has_likely_more_pages(&self) -> bool {
        self.page.items.len() == self.per_page
    }

    /// Items of the current page not yet in history, preserving page order.
    pub fn pending(&self, history: &HistoryStore) -> Vec<VideoItem> {
        self.page
            .items
            .iter()
            .filter(|item| !history.contains(item.id))
            .cloned()
            .collect()
    }
}
