//! Single-item downloader with streamed writes and a raw-URL fallback.

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::core::history::HistoryStore;
use crate::core::models::{AppError, AppResult, DownloadOutcome, VideoItem};
use crate::utils::file_utils::{extension_from_url, format_bytes};

/// Seam for the batch controller; production code uses [`ItemDownloader`],
/// tests substitute a mock.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    async fn download(
        &self,
        item: &VideoItem,
        history: &mut HistoryStore,
    ) -> AppResult<DownloadOutcome>;
}

/// Ids with a download currently in flight, shared with any surface that
/// wants to render a "processing" marker.
pub type ProcessingSet = Arc<Mutex<HashSet<u64>>>;

/// Removes the id from the processing set on every exit path, including
/// early returns and panics.
struct ProcessingGuard {
    set: ProcessingSet,
    id: u64,
}

impl ProcessingGuard {
    fn mark(set: &ProcessingSet, id: u64) -> Self {
        set.lock().insert(id);
        Self {
            set: Arc::clone(set),
            id,
        }
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

pub struct ItemDownloader {
    client: Client,
    output_dir: PathBuf,
    processing: ProcessingSet,
}

impl ItemDownloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            output_dir: output_dir.into(),
            processing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Handle for UI surfaces that render in-flight markers.
    pub fn processing(&self) -> ProcessingSet {
        Arc::clone(&self.processing)
    }

    pub fn is_processing(&self, id: u64) -> bool {
        self.processing.lock().contains(&id)
    }

    /// Deterministic local filename for one asset.
    pub fn filename_for(id: u64, url: &str) -> String {
        format!("pixabay-{}-full.{}", id, extension_from_url(url))
    }

    async fn save_variant(&self, id: u64, url: &str) -> AppResult<PathBuf> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ServerError(status.as_u16()));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(Self::filename_for(id, url));

        let mut file = File::create(&path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        info!(
            video = id,
            size = %format_bytes(written),
            path = %path.display(),
            "download saved"
        );

        Ok(path)
    }
}

#[async_trait]
impl VideoDownloader for ItemDownloader {
    /// Download the best rendition of `item`.
    ///
    /// Primary path: stream the payload to disk and mark history. Fallback
    /// path: any fetch or write failure degrades to handing the raw asset
    /// URL back to the caller; that path does not mark history.
    async fn download(
        &self,
        item: &VideoItem,
        history: &mut HistoryStore,
    ) -> AppResult<DownloadOutcome> {
        let variant = item
            .videos
            .best()
            .ok_or(AppError::NoPlayableVariant(item.id))?;

        let _guard = ProcessingGuard::mark(&self.processing, item.id);

        match self.save_variant(item.id, &variant.url).await {
            Ok(path) => {
                history.mark_downloaded(item.id)?;
                Ok(DownloadOutcome::Saved { path })
            }
            Err(err) => {
                warn!(
                    video = item.id,
                    error = %err,
                    "fetch failed, falling back to the raw asset URL"
                );
                Ok(DownloadOutcome::Fallback {
                    url: variant.url.clone(),
                })
            }
        }
    }
}
