//! Checkpoint model for resumable extraction
//!
//! One checkpoint per performance year records which NPIs have been fully
//! processed and staged, together with the year's counters at the last
//! commit. Resuming a run skips the completed NPIs and restores the
//! counters so the final statistics match an uninterrupted run.

use crate::domain::{CounterSnapshot, Npi, PerformanceYear};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Extraction status of one year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    /// Never started
    #[default]
    NotStarted,
    /// Batches are being committed
    InProgress,
    /// Every NPI for the year has been processed
    Completed,
    /// Stopped by a shutdown signal; resumable
    Interrupted,
    /// Stopped by a fatal error; resumable
    Failed,
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStatus::NotStarted => "not_started",
            CheckpointStatus::InProgress => "in_progress",
            CheckpointStatus::Completed => "completed",
            CheckpointStatus::Interrupted => "interrupted",
            CheckpointStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent progress of one performance year
///
/// # Examples
///
/// ```
/// use qpp_extract::core::state::{Checkpoint, CheckpointStatus};
/// use qpp_extract::domain::{CounterSnapshot, Npi, PerformanceYear};
///
/// let year = PerformanceYear::new(2024).unwrap();
/// let mut checkpoint = Checkpoint::new(year);
/// assert_eq!(checkpoint.status, CheckpointStatus::NotStarted);
///
/// checkpoint.mark_started();
/// checkpoint.record_batch([Npi::new("1234567890").unwrap()], CounterSnapshot::default());
/// assert!(checkpoint.is_done(&Npi::new("1234567890").unwrap()));
/// assert_eq!(checkpoint.batches_committed, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Performance year this checkpoint tracks
    pub year: PerformanceYear,

    /// NPIs whose rows are staged and committed
    #[serde(default)]
    pub completed: BTreeSet<Npi>,

    /// Number of batches committed across all runs
    #[serde(default)]
    pub batches_committed: u64,

    /// Year counters as of the last commit
    #[serde(default)]
    pub counters: CounterSnapshot,

    #[serde(default)]
    pub status: CheckpointStatus,

    /// When the current run of this year started
    pub started_at: DateTime<Utc>,

    /// Last commit time
    pub updated_at: DateTime<Utc>,

    /// Set once the year reaches a terminal status
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Creates an empty checkpoint for `year`
    pub fn new(year: PerformanceYear) -> Self {
        let now = Utc::now();
        Self {
            year,
            completed: BTreeSet::new(),
            batches_committed: 0,
            counters: CounterSnapshot::default(),
            status: CheckpointStatus::NotStarted,
            started_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// Whether `npi` was already processed for this year
    pub fn is_done(&self, npi: &Npi) -> bool {
        self.completed.contains(npi)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn is_completed(&self) -> bool {
        self.status == CheckpointStatus::Completed
    }

    /// Marks the start of a run over this year
    pub fn mark_started(&mut self) {
        let now = Utc::now();
        self.started_at = now;
        self.updated_at = now;
        self.finished_at = None;
        self.status = CheckpointStatus::InProgress;
    }

    /// Records a committed batch
    ///
    /// `counters` replaces the saved counters; it is the year's running
    /// total, not the batch delta.
    pub fn record_batch(&mut self, npis: impl IntoIterator<Item = Npi>, counters: CounterSnapshot) {
        self.completed.extend(npis);
        self.batches_committed += 1;
        self.counters = counters;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.finish(CheckpointStatus::Completed);
    }

    pub fn mark_interrupted(&mut self) {
        self.finish(CheckpointStatus::Interrupted);
    }

    pub fn mark_failed(&mut self) {
        self.finish(CheckpointStatus::Failed);
    }

    fn finish(&mut self, status: CheckpointStatus) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.finished_at = Some(now);
    }

    /// Wall time of the last finished run
    pub fn last_run_duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}
