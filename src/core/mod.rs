//! Core business logic module
//!
//! Domain models, the search client, the single-page/result stores and the
//! sequential batch download controller.

pub mod batch;
pub mod config;
pub mod downloader;
pub mod history;
pub mod models;
pub mod page_store;
pub mod search;


// Re-export commonly used types
pub use batch::BatchController;
pub use config::AppConfig;
pub use models::{AppError, AppResult};
