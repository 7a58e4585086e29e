//! Application configuration management
//!
//! Holds the persisted API credential and the batch/download knobs. Stored as
//! a JSON file under the platform config directory.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::search::MAX_PER_PAGE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pixabay API key; required for every search and download call.
    pub api_key: String,

    /// Requested page size, capped at the API maximum of 200.
    pub per_page: u32,

    /// Forwarded to the API's safesearch flag.
    pub safe_search: bool,

    /// Delay between two batch item downloads.
    pub batch_delay_seconds: u64,

    /// Fetch the next page automatically when a batch exhausts the current
    /// one.
    pub auto_next_page: bool,

    /// Where downloaded assets are written.
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            per_page: MAX_PER_PAGE,
            safe_search: true,
            batch_delay_seconds: 3,
            auto_next_page: true,
            output_directory: "downloads".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, creating the default if none exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Path of the persisted configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = Self::project_dirs()?;
        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Application data directory.
    pub fn data_dir() -> Result<PathBuf> {
        let project_dirs = Self::project_dirs()?;
        Ok(project_dirs.data_dir().to_path_buf())
    }

    /// Path of the persisted download history.
    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("history.json"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "pixabayhunter", "hunter")
            .with_context(|| "Failed to get project directories")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            anyhow::bail!("per_page must be between 1 and {}", MAX_PER_PAGE);
        }

        if self.batch_delay_seconds == 0 {
            anyhow::bail!("Batch delay must be at least 1 second");
        }

        if self.output_directory.trim().is_empty() {
            anyhow::bail!("Output directory must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.per_page, 200);
        assert!(config.safe_search);
        assert!(config.auto_next_page);
    }

    #[test]
    fn config_serialization_round_trips() {
        let config = AppConfig {
            api_key: "abc123".to_string(),
            per_page: 50,
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_key, "abc123");
        assert_eq!(parsed.per_page, 50);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = AppConfig::default();

        config.per_page = 0;
        assert!(config.validate().is_err());

        config.per_page = 500;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.batch_delay_seconds = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.output_directory = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
