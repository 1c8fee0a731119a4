//! File-backed checkpoint store
//!
//! One JSON document per year at `{dir}/checkpoint_{year}.json`, replaced
//! atomically on every commit.

use super::traits::CheckpointStore;
use super::write_atomic;
use crate::core::state::Checkpoint;
use crate::domain::{ExtractError, PerformanceYear, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "checkpoint_";
const FILE_SUFFIX: &str = ".json";

/// Checkpoint store writing JSON files into a directory
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Creates a store rooted at `dir`; the directory is created on first
    /// commit
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint file for `year`
    pub fn path_for(&self, year: PerformanceYear) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{year}{FILE_SUFFIX}"))
    }

    async fn read_checkpoint(path: &Path) -> Result<Option<Checkpoint>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ExtractError::Persistence(format!(
                    "Failed to read checkpoint {}: {e}",
                    path.display()
                )))
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            ExtractError::Persistence(format!(
                "Corrupt checkpoint {}: {e}",
                path.display()
            ))
        })
    }
}

/// Year encoded in a checkpoint file name, if it is one
fn year_from_file_name(name: &str) -> Option<u16> {
    name.strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse()
        .ok()
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, year: PerformanceYear) -> Result<Option<Checkpoint>> {
        Self::read_checkpoint(&self.path_for(year)).await
    }

    async fn commit(&self, checkpoint: &Checkpoint) -> Result<()> {
        let json = serde_json::to_vec_pretty(checkpoint).map_err(|e| {
            ExtractError::Persistence(format!("Failed to encode checkpoint: {e}"))
        })?;
        write_atomic(&self.path_for(checkpoint.year), &json).await
    }

    async fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ExtractError::Persistence(format!(
                    "Failed to list checkpoints in {}: {e}",
                    self.dir.display()
                )))
            }
        };

        let mut checkpoints = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                ExtractError::Persistence(format!(
                    "Failed to list checkpoints in {}: {e}",
                    self.dir.display()
                ))
            })?;
            let Some(entry) = entry else { break };

            let name = entry.file_name();
            if name.to_str().and_then(year_from_file_name).is_none() {
                continue;
            }
            if let Some(checkpoint) = Self::read_checkpoint(&entry.path()).await? {
                checkpoints.push(checkpoint);
            }
        }

        checkpoints.sort_by_key(|c| c.year);
        Ok(checkpoints)
    }

    async fn clear(&self, year: PerformanceYear) -> Result<()> {
        let path = self.path_for(year);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(year = %year, path = %path.display(), "Cleared checkpoint");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExtractError::Persistence(format!(
                "Failed to remove checkpoint {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CounterSnapshot, Npi};
    use tempfile::TempDir;

    fn year(y: u16) -> PerformanceYear {
        PerformanceYear::new(y).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoints"));
        assert!(store.load(year(2023)).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("checkpoints"));

        let mut checkpoint = Checkpoint::new(year(2024));
        checkpoint.mark_started();
        checkpoint.record_batch(
            [Npi::new("1234567890").unwrap()],
            CounterSnapshot {
                successful: 1,
                total_api_calls: 1,
                ..Default::default()
            },
        );
        store.commit(&checkpoint).await.unwrap();

        let path = store.path_for(year(2024));
        assert!(path.ends_with("checkpoint_2024.json"));
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = store.load(year(2024)).await.unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[tokio::test]
    async fn test_commit_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());

        let mut checkpoint = Checkpoint::new(year(2023));
        store.commit(&checkpoint).await.unwrap();
        checkpoint.record_batch([Npi::new("0000000000").unwrap()], CounterSnapshot::default());
        store.commit(&checkpoint).await.unwrap();

        let loaded = store.load(year(2023)).await.unwrap().unwrap();
        assert_eq!(loaded.batches_committed, 1);
    }

    #[tokio::test]
    async fn test_list_sorted_and_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());

        store.commit(&Checkpoint::new(year(2025))).await.unwrap();
        store.commit(&Checkpoint::new(year(2023))).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("checkpoint_2024.json.tmp"), "{").unwrap();

        let years: Vec<u16> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|c| c.year.get())
            .collect();
        assert_eq!(years, vec![2023, 2025]);
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        std::fs::write(store.path_for(year(2023)), "{not json").unwrap();

        let err = store.load(year(2023)).await.unwrap_err();
        assert!(matches!(err, ExtractError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.commit(&Checkpoint::new(year(2023))).await.unwrap();

        store.clear(year(2023)).await.unwrap();
        assert!(store.load(year(2023)).await.unwrap().is_none());
        store.clear(year(2023)).await.unwrap();
    }

    #[test]
    fn test_year_from_file_name() {
        assert_eq!(year_from_file_name("checkpoint_2023.json"), Some(2023));
        assert_eq!(year_from_file_name("checkpoint_2023.json.tmp"), None);
        assert_eq!(year_from_file_name("other.json"), None);
    }
}
