//! Sequential batch download controller with optional page auto-advance.
//!
//! The controller walks the current result page in order, downloading every
//! item not yet in history with a fixed delay between items. When the page is
//! exhausted and auto-advance is on, it fetches the next page, replaces the
//! page store wholesale and continues until a page comes back empty. One
//! shared flag provides cooperative cancellation; in-flight item downloads
//! are never aborted, the controller simply stops scheduling further work.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::core::downloader::VideoDownloader;
use crate::core::history::HistoryStore;
use crate::core::models::{
    AppError, AppResult, BatchProgress, BatchReport, DownloadOutcome, ResultPage,
};
use crate::core::page_store::PageStore;

/// Fetches one page of results for the controller; implemented by the search
/// client, mocked in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, term: &str, page: u32) -> AppResult<ResultPage>;
}

/// Controller lifecycle. Stopping is terminal for a run; a new `run` re-arms
/// the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BatchState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Delay between two item downloads, throttling the remote API.
    pub item_delay: Duration,

    /// Pause after a page is exhausted, before the next page fetch.
    pub settle_delay: Duration,

    /// Whether to fetch the next page once the current one is exhausted.
    pub auto_next_page: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_secs(3),
            settle_delay: Duration::from_secs(2),
            auto_next_page: true,
        }
    }
}

/// Cheaply cloneable: every field is shared, so a clone can serve as a stop
/// handle or progress reader on another task.
#[derive(Clone)]
pub struct BatchController {
    options: BatchOptions,
    stop_flag: Arc<AtomicBool>,
    state: Arc<RwLock<BatchState>>,
    progress: Arc<RwLock<Option<BatchProgress>>>,
}

impl BatchController {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            stop_flag: Arc::new(AtomicBool::new(false)),
            state: Arc::new(RwLock::new(BatchState::Idle)),
            progress: Arc::new(RwLock::new(None)),
        }
    }

    pub fn state(&self) -> BatchState {
        *self.state.read()
    }

    pub fn progress(&self) -> Option<BatchProgress> {
        *self.progress.read()
    }

    /// Request cooperative cancellation. Observed at the top of every item
    /// iteration and around every suspension point.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        info!("batch stop requested");
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    fn reset_progress(&self, total: usize, page_number: u32) {
        *self.progress.write() = Some(BatchProgress {
            current_index: 0,
            total,
            page_number,
        });
    }

    fn advance_progress(&self, current_index: usize) {
        if let Some(progress) = self.progress.write().as_mut() {
            progress.current_index = current_index;
        }
    }

    fn finish(&self, report: &mut BatchReport) {
        report.cancelled = self.stop_requested();
        report.finished_at = Utc::now();
        *self.progress.write() = None;
        *self.state.write() = if report.cancelled {
            BatchState::Stopped
        } else {
            BatchState::Idle
        };
    }

    /// Run one batch over the store's current page (and, with auto-advance,
    /// its successors). Per-item failures are isolated; a failed page fetch
    /// terminates the run with [`AppError::PageFetch`].
    pub async fn run(
        &self,
        term: &str,
        store: &mut PageStore,
        history: &mut HistoryStore,
        downloader: &dyn VideoDownloader,
        pages: &dyn PageFetcher,
    ) -> AppResult<BatchReport> {
        self.stop_flag.store(false, Ordering::Relaxed);
        *self.state.write() = BatchState::Running;

        let mut report = BatchReport::started(Utc::now());
        info!(term, page = store.page_number(), "batch started");

        'pages: loop {
            let pending = store.pending(history);
            self.reset_progress(pending.len(), store.page_number());

            if pending.is_empty() && !self.options.auto_next_page {
                info!("every video on the current page is already in history");
                break;
            }

            let total = pending.len();
            for (index, item) in pending.iter().enumerate() {
                if self.stop_requested() {
                    break 'pages;
                }

                self.advance_progress(index + 1);
                match downloader.download(item, history).await {
                    Ok(DownloadOutcome::Saved { .. }) => report.downloaded += 1,
                    Ok(DownloadOutcome::Fallback { url }) => {
                        warn!(video = item.id, %url, "nothing saved; raw URL surfaced instead");
                        report.fallbacks += 1;
                    }
                    Err(err) => {
                        warn!(video = item.id, error = %err, "item failed, batch continues");
                        report.failed += 1;
                    }
                }

                if index + 1 < total && !self.stop_requested() {
                    sleep(self.options.item_delay).await;
                }
            }

            if self.stop_requested() || !self.options.auto_next_page {
                break;
            }

            // Let the API breathe before the page fetch.
            sleep(self.options.settle_delay).await;
            if self.stop_requested() {
                break;
            }

            let next_page = store.page_number() + 1;
            match pages.fetch_page(term, next_page).await {
                Ok(page) if page.items.is_empty() => {
                    info!(page = next_page, "no more results, batch done");
                    break;
                }
                Ok(page) => {
                    info!(page = next_page, hits = page.items.len(), "advanced to next page");
                    store.replace(page.items, next_page);
                    report.pages_visited += 1;
                }
                Err(err) => {
                    self.finish(&mut report);
                    return Err(AppError::PageFetch {
                        page: next_page,
                        source: Box::new(err),
                    });
                }
            }
        }

        self.finish(&mut report);
        info!(
            downloaded = report.downloaded,
            fallbacks = report.fallbacks,
            failed = report.failed,
            pages = report.pages_visited,
            cancelled = report.cancelled,
            "batch finished"
        );

        Ok(report)
    }
}
