//! Pixabay Hunter - Core Library
//!
//! Search the Pixabay video API page by page, keep exactly one page of
//! results in memory, and drive sequential batch downloads with a persisted
//! download history.

pub mod core;
pub mod utils;

// Re-export commonly used types
pub use core::{
    batch::{BatchController, BatchOptions, BatchState, PageFetcher},
    config::AppConfig,
    downloader::{ItemDownloader, VideoDownloader},
    history::HistoryStore,
    models::{
        AppError, AppResult, BatchProgress, BatchReport, DownloadOutcome, ResultPage, SearchQuery,
        VideoItem,
    },
    page_store::PageStore,
    search::{SearchClient, SearchClientConfig},
};

/// Everything the CLI surface needs, wired from the persisted configuration.
pub struct AppState {
    pub config: AppConfig,
    pub search: SearchClient,
    pub downloader: ItemDownloader,
    pub page_store: PageStore,
    pub history: HistoryStore,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        let config = Self::load_or_initialize_config();

        let search = SearchClient::new(SearchClientConfig {
            api_key: config.api_key.clone(),
            per_page: config.per_page,
            safe_search: config.safe_search,
            ..Default::default()
        });

        let downloader = ItemDownloader::new(&config.output_directory);
        let page_store = PageStore::new(config.per_page as usize);
        let history = HistoryStore::load(AppConfig::history_path()?)?;

        Ok(Self {
            config,
            search,
            downloader,
            page_store,
            history,
        })
    }

    fn load_or_initialize_config() -> AppConfig {
        match AppConfig::load() {
            Ok(cfg) => {
                if let Err(err) = cfg.validate() {
                    tracing::warn!(
                        "Invalid configuration detected ({}), falling back to defaults",
                        err
                    );
                    let default_cfg = AppConfig::default();
                    if let Err(save_err) = default_cfg.save() {
                        tracing::warn!("Failed to persist default configuration: {}", save_err);
                    }
                    default_cfg
                } else {
                    cfg
                }
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {}. Using defaults",
                    err
                );
                let default_cfg = AppConfig::default();
                if let Err(save_err) = default_cfg.save() {
                    tracing::warn!("Failed to persist default configuration: {}", save_err);
                }
                default_cfg
            }
        }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
