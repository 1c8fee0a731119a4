//! Batch processing for eligibility lookups
//!
//! This module runs one batch of work items through a bounded worker pool,
//! stages the resulting rows and commits the year's checkpoint.

use crate::adapters::qpp::QppClient;
use crate::adapters::storage::{RawArchive, StagingArea};
use crate::core::normalize::{Normalizer, Row, ValidationIssue};
use crate::core::state::{Checkpoint, StateManager};
use crate::domain::{FetchOutcome, Npi, PerformanceYear, Result, WorkItem};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;

/// Result of processing a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Work items that reached a terminal outcome
    pub processed: usize,
    pub successful: usize,
    pub not_found: usize,
    /// Client errors and exhausted retries
    pub failed: usize,
    /// Items not started because shutdown was requested
    pub skipped: usize,
    /// Rows staged across all six tables
    pub rows: usize,
    pub validation_issues: usize,
}

impl BatchResult {
    /// Create a new empty batch result
    pub fn new() -> Self {
        Self::default()
    }

    fn add_outcome(&mut self, outcome: FetchOutcome) {
        self.processed += 1;
        match outcome {
            FetchOutcome::Success => self.successful += 1,
            FetchOutcome::NotFound => self.not_found += 1,
            _ => self.failed += 1,
        }
    }

    /// Merge another batch result into this one
    pub fn merge(&mut self, other: &BatchResult) {
        self.processed += other.processed;
        self.successful += other.successful;
        self.not_found += other.not_found;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.rows += other.rows;
        self.validation_issues += other.validation_issues;
    }

    /// Whether some items were left for a later run
    pub fn was_interrupted(&self) -> bool {
        self.skipped > 0
    }
}

/// Terminal result of one work item
struct ItemResult {
    npi: Npi,
    outcome: FetchOutcome,
    rows: Vec<Row>,
    issues: Vec<ValidationIssue>,
}

/// Batch processor for work items of one year
pub struct BatchProcessor {
    client: Arc<QppClient>,
    normalizer: Normalizer,
    raw_archive: Option<RawArchive>,
    staging: StagingArea,
    state_manager: Arc<StateManager>,
    max_workers: usize,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(
        client: Arc<QppClient>,
        staging: StagingArea,
        state_manager: Arc<StateManager>,
        max_workers: usize,
    ) -> Self {
        Self {
            client,
            normalizer: Normalizer::new(),
            raw_archive: None,
            staging,
            state_manager,
            max_workers: max_workers.max(1),
        }
    }

    /// Archive successful response bodies under the given archive
    pub fn with_raw_archive(mut self, archive: Option<RawArchive>) -> Self {
        self.raw_archive = archive;
        self
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Process a batch of NPIs for one year
    ///
    /// This method:
    /// 1. Looks up every NPI with at most `max_workers` requests in flight
    /// 2. Archives successful bodies when raw archiving is enabled
    /// 3. Normalizes successful records into rows
    /// 4. Stages the rows and issues as batch `batches_committed`
    /// 5. Commits the checkpoint with the completed NPIs and year counters
    ///
    /// Once `shutdown` flips to `true` no further item is started; items
    /// already in flight finish and are committed with the rest.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if staging or the checkpoint commit
    /// fails. Per-item lookup failures are counted, never returned.
    pub async fn process_batch(
        &self,
        year: PerformanceYear,
        npis: &[Npi],
        run_number: Option<u32>,
        shutdown: &watch::Receiver<bool>,
        checkpoint: &mut Checkpoint,
    ) -> Result<BatchResult> {
        let mut result = BatchResult::new();

        if npis.is_empty() {
            tracing::debug!(year = %year, "No work items in batch");
            return Ok(result);
        }

        tracing::debug!(year = %year, batch_size = npis.len(), "Processing batch of work items");

        let mut items: Vec<(usize, Option<ItemResult>)> = stream::iter(npis.iter().cloned().enumerate())
            .map(|(index, npi)| {
                let shutdown = shutdown.clone();
                async move {
                    if *shutdown.borrow() {
                        return (index, None);
                    }
                    let item = WorkItem::new(npi, year).with_run_number(run_number);
                    (index, Some(self.process_item(item).await))
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;
        items.sort_by_key(|(index, _)| *index);

        let mut completed = Vec::with_capacity(items.len());
        let mut rows = Vec::new();
        let mut issues = Vec::new();
        for (_, item) in items {
            match item {
                Some(item) => {
                    result.add_outcome(item.outcome);
                    completed.push(item.npi);
                    rows.extend(item.rows);
                    issues.extend(item.issues);
                }
                None => result.skipped += 1,
            }
        }
        result.rows = rows.len();
        result.validation_issues = issues.len();

        if completed.is_empty() {
            tracing::info!(year = %year, skipped = result.skipped, "Batch stopped before any item started");
            return Ok(result);
        }

        let path = self
            .staging
            .write_batch(year, checkpoint.batches_committed, &rows, &issues)
            .await?;
        tracing::debug!(year = %year, path = %path.display(), rows = rows.len(), "Staged batch");

        let counters = self.client.stats().year(year).unwrap_or_default();
        checkpoint.record_batch(completed, counters);
        self.state_manager.checkpoint_batch(checkpoint).await?;

        Ok(result)
    }

    /// Fetch, archive and normalize one work item
    async fn process_item(&self, item: WorkItem) -> ItemResult {
        let record = self.client.fetch(&item).await;

        if let Some(archive) = &self.raw_archive {
            if let Err(e) = archive.save(&record).await {
                tracing::warn!(item = %item, error = %e, "Failed to archive raw response");
            }
        }

        if !record.is_success() {
            tracing::debug!(
                item = %item,
                outcome = %record.outcome,
                status = ?record.status,
                error = record.error.as_deref().unwrap_or_default(),
                "Lookup produced no record"
            );
            return ItemResult {
                npi: item.npi,
                outcome: record.outcome,
                rows: Vec::new(),
                issues: Vec::new(),
            };
        }

        let normalization = self.normalizer.normalize(&record);
        for issue in &normalization.issues {
            tracing::warn!(issue = %issue, "Validation issue");
        }
        self.client
            .stats()
            .record_validation_errors(item.year, normalization.issues.len() as u64);

        ItemResult {
            npi: item.npi,
            outcome: record.outcome,
            rows: normalization.record.rows,
            issues: normalization.issues,
        }
    }
}
