//! Core data models for the Pixabay video client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One quality rendition of a video asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoVariant {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub width: u32,

    #[serde(default)]
    pub height: u32,

    #[serde(default)]
    pub size: u64,
}

/// The quality tiers the API offers for one video.
///
/// Tiers may be absent depending on the source material. The `small` tier is
/// deserialized but never auto-selected for downloads; only preview surfaces
/// use it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRenditions {
    #[serde(default)]
    pub large: Option<VideoVariant>,

    #[serde(default)]
    pub medium: Option<VideoVariant>,

    #[serde(default)]
    pub small: Option<VideoVariant>,

    #[serde(default)]
    pub tiny: Option<VideoVariant>,
}

impl VideoRenditions {
    /// Highest available tier in download preference order: large, medium,
    /// tiny. Tiers without a URL are skipped.
    pub fn best(&self) -> Option<&VideoVariant> {
        [&self.large, &self.medium, &self.tiny]
            .into_iter()
            .flatten()
            .find(|variant| !variant.url.is_empty())
    }
}

/// One search hit, sourced verbatim from the API and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: u64,

    #[serde(default)]
    pub duration: u32,

    #[serde(default)]
    pub tags: String,

    #[serde(rename = "pageURL", default)]
    pub page_url: String,

    #[serde(default)]
    pub picture_id: String,

    #[serde(default)]
    pub videos: VideoRenditions,
}

/// A single paginated query. Immutable per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub page: u32,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, page: u32) -> Self {
        Self {
            term: term.into(),
            page: page.max(1),
        }
    }
}

/// Wire shape of the search endpoint reply. An absent `hits` array means no
/// results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total: u64,

    #[serde(rename = "totalHits", default)]
    pub total_hits: u64,

    #[serde(default)]
    pub hits: Vec<VideoItem>,
}

/// Exactly one page of results.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub page_number: u32,
    pub items: Vec<VideoItem>,
}

/// Transient progress of a running batch. Reset at batch start, cleared at
/// batch end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub current_index: usize,
    pub total: usize,
    pub page_number: u32,
}

/// How a single-item download ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Payload streamed to disk and recorded in history.
    Saved { path: PathBuf },

    /// The fetch failed; the raw asset URL is handed back to the operator
    /// instead. History is deliberately not touched on this path.
    Fallback { url: String },
}

/// Summary of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub downloaded: usize,
    pub fallbacks: usize,
    pub failed: usize,
    pub pages_visited: u32,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            downloaded: 0,
            fallbacks: 0,
            failed: 0,
            pages_visited: 1,
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API key is not configured")]
    MissingCredential,

    #[error("invalid request; check the search term and API key")]
    InvalidRequest,

    #[error("rate limit exceeded; wait a moment before retrying")]
    RateLimited,

    #[error("search API returned status {0}")]
    ServerError(u16),

    #[error("video {0} has no playable variant")]
    NoPlayableVariant(u64),

    #[error("history import expects a JSON array of integer ids")]
    ImportError,

    #[error("failed to fetch page {page}: {source}")]
    PageFetch { page: u32, source: Box<AppError> },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
