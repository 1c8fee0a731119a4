//! Archive of raw eligibility responses
//!
//! Successful lookups are written to `{dir}/{year}/{npi}.json` exactly as
//! unwrapped from the response envelope. The archive is write-only from the
//! extractor's point of view and is kept for audit and reprocessing.

use super::write_atomic;
use crate::domain::{ExtractError, Npi, PerformanceYear, RawRecord, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RawArchive {
    dir: PathBuf,
}

impl RawArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, year: PerformanceYear, npi: &Npi) -> PathBuf {
        self.dir
            .join(year.to_string())
            .join(format!("{}.json", npi.as_str()))
    }

    /// Archives the body of a successful record
    ///
    /// Returns the written path, or `None` when the record has no body.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the file cannot be written.
    pub async fn save(&self, record: &RawRecord) -> Result<Option<PathBuf>> {
        let Some(body) = record.body.as_ref().filter(|_| record.is_success()) else {
            return Ok(None);
        };

        let json = serde_json::to_vec_pretty(body).map_err(|e| {
            ExtractError::Persistence(format!("Failed to encode raw response: {e}"))
        })?;
        let path = self.path_for(record.item.year, &record.item.npi);
        write_atomic(&path, &json).await?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FetchOutcome, WorkItem};
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    fn item() -> WorkItem {
        WorkItem::new(
            Npi::new("1234567890").unwrap(),
            PerformanceYear::new(2024).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_saves_success_body() {
        let dir = TempDir::new().unwrap();
        let archive = RawArchive::new(dir.path());
        let record = RawRecord::success(item(), json!({"npi": "1234567890"}), Utc::now());

        let path = archive.save(&record).await.unwrap().unwrap();
        assert!(path.ends_with("2024/1234567890.json"));

        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(saved["npi"], "1234567890");
    }

    #[tokio::test]
    async fn test_skips_failures() {
        let dir = TempDir::new().unwrap();
        let archive = RawArchive::new(dir.path());
        let record = RawRecord::failure(
            item(),
            FetchOutcome::NotFound,
            Some(404),
            "not found",
            Utc::now(),
        );
        assert!(archive.save(&record).await.unwrap().is_none());
        assert!(!dir.path().join("2024").exists());
    }
}
