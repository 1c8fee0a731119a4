//! Durable per-batch staging of normalized rows
//!
//! Every batch writes one JSON Lines file,
//! `{dir}/{year}/batch_{seq:06}.jsonl`, before its checkpoint is committed.
//! A batch replayed after a crash reuses its sequence number and overwrites
//! the file, so staged rows never duplicate. Readers walk the files in
//! sequence order and decode one line at a time.

use super::write_atomic;
use crate::core::normalize::{Row, TableKind, ValidationIssue};
use crate::domain::{ExtractError, PerformanceYear, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// One line of a staged batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagedEntry {
    Row(Row),
    Issue(ValidationIssue),
}

/// Staging directory for all years
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn year_dir(&self, year: PerformanceYear) -> PathBuf {
        self.dir.join(year.to_string())
    }

    /// Path of batch `seq` for `year`
    pub fn batch_path(&self, year: PerformanceYear, seq: u64) -> PathBuf {
        self.year_dir(year).join(format!("batch_{seq:06}.jsonl"))
    }

    /// Writes one batch atomically, replacing any earlier file with the same
    /// sequence number
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the file cannot be written.
    pub async fn write_batch(
        &self,
        year: PerformanceYear,
        seq: u64,
        rows: &[Row],
        issues: &[ValidationIssue],
    ) -> Result<PathBuf> {
        let mut buf = Vec::new();
        let entries = rows
            .iter()
            .cloned()
            .map(StagedEntry::Row)
            .chain(issues.iter().cloned().map(StagedEntry::Issue));
        for entry in entries {
            serde_json::to_writer(&mut buf, &entry).map_err(|e| {
                ExtractError::Persistence(format!("Failed to encode staged entry: {e}"))
            })?;
            buf.push(b'\n');
        }

        let path = self.batch_path(year, seq);
        write_atomic(&path, &buf).await?;
        tracing::debug!(
            year = %year,
            seq,
            rows = rows.len(),
            issues = issues.len(),
            path = %path.display(),
            "Staged batch"
        );
        Ok(path)
    }

    /// Batch files for a year in sequence order
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the directory cannot be listed.
    pub fn batch_files(&self, year: PerformanceYear) -> Result<Vec<PathBuf>> {
        let dir = self.year_dir(year);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ExtractError::Persistence(format!(
                    "Failed to list staging directory {}: {e}",
                    dir.display()
                )))
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    ExtractError::Persistence(format!(
                        "Failed to list staging directory {}: {e}",
                        dir.display()
                    ))
                })?
                .path();
            let is_batch = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("batch_") && n.ends_with(".jsonl"));
            if is_batch {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Lazily reads every staged entry for a year
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the directory cannot be listed;
    /// per-line read and decode failures are yielded by the iterator.
    pub fn entries(&self, year: PerformanceYear) -> Result<StagedEntries> {
        Ok(StagedEntries {
            files: self.batch_files(year)?.into_iter(),
            current: None,
        })
    }

    /// Lazily reads the staged rows of one table for a year
    ///
    /// # Errors
    ///
    /// See [`StagingArea::entries`].
    pub fn rows(
        &self,
        year: PerformanceYear,
        table: TableKind,
    ) -> Result<impl Iterator<Item = Result<Row>>> {
        Ok(self.entries(year)?.filter_map(move |entry| match entry {
            Ok(StagedEntry::Row(row)) if row.table == table => Some(Ok(row)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        }))
    }

    /// Reads every staged validation issue for a year
    ///
    /// # Errors
    ///
    /// Returns a persistence error if a batch file cannot be read.
    pub fn issues(&self, year: PerformanceYear) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        for entry in self.entries(year)? {
            if let StagedEntry::Issue(issue) = entry? {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    /// Deletes batch files numbered `seq` or higher
    ///
    /// Such files were staged by a run that stopped before committing them;
    /// their NPIs are still pending and will be staged again.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if a file cannot be removed.
    pub async fn discard_from(&self, year: PerformanceYear, seq: u64) -> Result<usize> {
        let mut removed = 0;
        for path in self.batch_files(year)? {
            let file_seq = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix("batch_"))
                .and_then(|n| n.parse::<u64>().ok());
            if file_seq.is_some_and(|n| n >= seq) {
                tokio::fs::remove_file(&path).await.map_err(|e| {
                    ExtractError::Persistence(format!(
                        "Failed to discard uncommitted batch {}: {e}",
                        path.display()
                    ))
                })?;
                tracing::warn!(year = %year, path = %path.display(), "Discarded uncommitted batch");
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes all staged batches for a year
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the directory cannot be removed.
    pub async fn clear(&self, year: PerformanceYear) -> Result<()> {
        let dir = self.year_dir(year);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExtractError::Persistence(format!(
                "Failed to clear staging directory {}: {e}",
                dir.display()
            ))),
        }
    }
}

/// Iterator over the staged entries of one year
pub struct StagedEntries {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, Lines<BufReader<File>>)>,
}

impl Iterator for StagedEntries {
    type Item = Result<StagedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((path, lines)) = self.current.as_mut() {
                match lines.next() {
                    Some(Ok(line)) if line.trim().is_empty() => continue,
                    Some(Ok(line)) => {
                        return Some(serde_json::from_str(&line).map_err(|e| {
                            ExtractError::Persistence(format!(
                                "Corrupt staged entry in {}: {e}",
                                path.display()
                            ))
                        }))
                    }
                    Some(Err(e)) => {
                        return Some(Err(ExtractError::Persistence(format!(
                            "Failed to read {}: {e}",
                            path.display()
                        ))))
                    }
                    None => self.current = None,
                }
            }

            let path = self.files.next()?;
            match File::open(&path) {
                Ok(file) => self.current = Some((path, BufReader::new(file).lines())),
                Err(e) => {
                    return Some(Err(ExtractError::Persistence(format!(
                        "Failed to open {}: {e}",
                        path.display()
                    ))))
                }
            }
        }
    }
}
