//! Persisted set of already-downloaded video ids.
//!
//! The history is a JSON array of integer ids on disk. Every mutation is
//! flushed before returning, so the set survives process restarts even after
//! a crash mid-batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::models::{AppError, AppResult};

pub struct HistoryStore {
    path: PathBuf,
    ids: BTreeSet<u64>,
}

impl HistoryStore {
    /// Load the history from `path`. A missing file yields an empty store; a
    /// corrupt file is discarded with a warning rather than blocking startup.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let ids = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Vec<u64>>(&content) {
                Ok(ids) => ids.into_iter().collect(),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "history file is unreadable, starting with an empty set"
                    );
                    BTreeSet::new()
                }
            }
        } else {
            BTreeSet::new()
        };

        Ok(Self { path, ids })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record one downloaded id. Flushed to disk before returning.
    pub fn mark_downloaded(&mut self, id: u64) -> AppResult<()> {
        if self.ids.insert(id) {
            self.flush()?;
        }
        Ok(())
    }

    /// Union-merge a set of ids into the history. Returns how many ids were
    /// actually new. Idempotent on identical input.
    pub fn bulk_merge(&mut self, ids: impl IntoIterator<Item = u64>) -> AppResult<usize> {
        let before = self.ids.len();
        self.ids.extend(ids);
        let added = self.ids.len() - before;
        if added > 0 {
            self.flush()?;
        }
        Ok(added)
    }

    /// Drop every recorded id. Flushed to disk before returning.
    pub fn clear(&mut self) -> AppResult<()> {
        if !self.ids.is_empty() {
            self.ids.clear();
            self.flush()?;
        }
        info!("download history cleared");
        Ok(())
    }

    /// Ids in stable ascending order.
    pub fn export_ids(&self) -> Vec<u64> {
        self.ids.iter().copied().collect()
    }

    /// Serialize the history as the interchange format: a JSON array of ids.
    pub fn export_json(&self) -> AppResult<String> {
        let json = serde_json::to_string(&self.export_ids()).map_err(std::io::Error::from)?;
        Ok(json)
    }

    /// Union-merge a JSON payload into the history. Only a JSON array of
    /// integer ids is accepted; any other shape is rejected with
    /// [`AppError::ImportError`] and the store is left untouched, in memory
    /// and on disk.
    pub fn import_json(&mut self, payload: &str) -> AppResult<usize> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|_| AppError::ImportError)?;

        let entries = value.as_array().ok_or(AppError::ImportError)?;

        // Validate every entry before touching the set, so a bad payload has
        // no side effects.
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            ids.push(entry.as_u64().ok_or(AppError::ImportError)?);
        }

        let added = self.bulk_merge(ids)?;
        info!(added, total = self.ids.len(), "history import merged");
        Ok(added)
    }

    fn flush(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.export_ids()).map_err(std::io::Error::from)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> HistoryStore {
        HistoryStore::load(dir.path().join("history.json")).unwrap()
    }

    #[test]
    fn starts_empty_without_a_file() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
    }

    #[test]
    fn mark_downloaded_is_flushed_before_returning() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        store.mark_downloaded(42).unwrap();
        store.mark_downloaded(7).unwrap();

        // A fresh load from the same path sees both ids.
        let reloaded = store_in(&dir);
        assert!(reloaded.contains(42));
        assert!(reloaded.contains(7));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn export_is_ordered_ascending() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.bulk_merge([9, 1, 5]).unwrap();
        assert_eq!(store.export_ids(), vec![1, 5, 9]);
    }

    #[test]
    fn import_rejects_non_array_payload_without_side_effects() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.mark_downloaded(1).unwrap();

        let err = store.import_json(r#"{"ids": [2, 3]}"#).unwrap_err();
        assert!(matches!(err, AppError::ImportError));
        assert_eq!(store.export_ids(), vec![1]);

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.export_ids(), vec![1]);
    }

    #[test]
    fn import_rejects_non_integer_entries_without_side_effects() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.mark_downloaded(1).unwrap();

        let err = store.import_json(r#"[2, "three", 4]"#).unwrap_err();
        assert!(matches!(err, AppError::ImportError));
        assert_eq!(store.export_ids(), vec![1]);
    }

    #[test]
    fn export_then_import_round_trips() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        // Empty history round-trips to an empty history.
        let empty = store.export_json().unwrap();
        assert_eq!(store.import_json(&empty).unwrap(), 0);
        assert!(store.is_empty());

        store.bulk_merge([10, 20, 30]).unwrap();
        let json = store.export_json().unwrap();

        // Union-merge is idempotent on identical input.
        assert_eq!(store.import_json(&json).unwrap(), 0);
        assert_eq!(store.export_ids(), vec![10, 20, 30]);
    }

    #[test]
    fn import_merges_into_existing_set() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.bulk_merge([1, 2]).unwrap();

        let added = store.import_json("[2, 3, 4]").unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.export_ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn clear_persists() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.bulk_merge([1, 2, 3]).unwrap();

        store.clear().unwrap();
        assert!(store.is_empty());

        let reloaded = store_in(&dir);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = HistoryStore::load(&path).unwrap();
        assert!(store.is_empty());
    }
}
