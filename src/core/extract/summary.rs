//! Run summary and reporting
//!
//! This module defines structures for tracking and reporting extraction
//! results, and writes `reports/processing_summary.json`.

use crate::adapters::storage::write_atomic;
use crate::core::normalize::ValidationIssue;
use crate::core::state::CheckpointStatus;
use crate::domain::{CounterSnapshot, ExtractError, PerformanceYear, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// File name of the processing summary
pub const PROCESSING_SUMMARY_FILE: &str = "processing_summary.json";

/// Lifecycle of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    /// Stopped by a shutdown signal; a later run resumes
    Interrupted,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Interrupted | RunState::Failed
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Pending => "pending",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Interrupted => "interrupted",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of one performance year
#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: PerformanceYear,
    pub status: CheckpointStatus,
    pub total_identifiers: u64,
    /// Completed by earlier runs and skipped
    pub resumed: u64,
    /// Completed by this run
    pub processed: u64,
    /// Not yet completed
    pub remaining: u64,
    pub batches_committed: u64,
    pub successful: u64,
    pub npis_with_404: u64,
    pub npis_with_client_error: u64,
    pub npis_with_other_errors: u64,
    pub rate_limit_hits: u64,
    pub validation_errors: u64,
    pub average_time_ms: f64,
    pub total_time_secs: f64,
    /// Rows per table
    pub record_counts: BTreeMap<String, u64>,
    /// Percentage of non-null values per table and column
    pub field_completeness: BTreeMap<String, BTreeMap<String, f64>>,
    pub statistics: CounterSnapshot,
}

impl YearSummary {
    /// Builds the year summary from its counters
    pub fn new(year: PerformanceYear, status: CheckpointStatus, statistics: CounterSnapshot) -> Self {
        Self {
            year,
            status,
            total_identifiers: statistics.total_identifiers,
            resumed: 0,
            processed: 0,
            remaining: 0,
            batches_committed: 0,
            successful: statistics.successful,
            npis_with_404: statistics.not_found,
            npis_with_client_error: statistics.client_errors,
            npis_with_other_errors: statistics.exhausted_retries(),
            rate_limit_hits: statistics.rate_limit_hits,
            validation_errors: statistics.validation_errors,
            average_time_ms: statistics.average_latency_ms(),
            total_time_secs: 0.0,
            record_counts: BTreeMap::new(),
            field_completeness: BTreeMap::new(),
            statistics,
        }
    }
}

/// Type of run error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorType {
    /// Invalid configuration or input set
    Configuration,
    /// Checkpoint or staging failure
    Persistence,
    /// CSV or report output failure
    Export,
    /// Unknown error
    Unknown,
}

impl RunErrorType {
    /// Classifies a crate error
    pub fn of(error: &ExtractError) -> Self {
        match error {
            ExtractError::Configuration(_) | ExtractError::Input(_) => RunErrorType::Configuration,
            ExtractError::Persistence(_) | ExtractError::Io(_) => RunErrorType::Persistence,
            ExtractError::Export(_) | ExtractError::Serialization(_) => RunErrorType::Export,
            _ => RunErrorType::Unknown,
        }
    }
}

/// Run error with context
#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    pub error_type: RunErrorType,
    pub message: String,
    /// Optional context (e.g., the year)
    pub context: Option<String>,
}

impl RunError {
    pub fn new(error_type: RunErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Builds a run error from a crate error
    pub fn from_error(error: &ExtractError) -> Self {
        Self::new(RunErrorType::of(error), error.to_string())
    }

    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

/// Summary of an extraction run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    /// Stopped early by a shutdown signal
    pub interrupted: bool,
    pub shutdown_reason: Option<String>,
    pub statistics: CounterSnapshot,
    pub years: Vec<YearSummary>,
    pub validation_issues: Vec<ValidationIssue>,
    pub errors: Vec<RunError>,
    pub csv_files: Vec<PathBuf>,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: RunState::Pending,
            started_at: Utc::now(),
            finished_at: None,
            duration: Duration::ZERO,
            interrupted: false,
            shutdown_reason: None,
            statistics: CounterSnapshot::default(),
            years: Vec::new(),
            validation_issues: Vec::new(),
            errors: Vec::new(),
            csv_files: Vec::new(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, error: RunError) {
        self.errors.push(error);
    }

    /// Completed without run-level errors (per-item failures allowed)
    pub fn is_successful(&self) -> bool {
        self.state == RunState::Completed && self.errors.is_empty()
    }

    /// Successful lookups as a percentage of all lookups
    pub fn success_rate(&self) -> f64 {
        self.statistics.success_rate()
    }

    /// Summary of one year
    pub fn year(&self, year: PerformanceYear) -> Option<&YearSummary> {
        self.years.iter().find(|y| y.year == year)
    }

    /// Writes `processing_summary.json` into `dir`
    ///
    /// # Errors
    ///
    /// Returns an export error if the summary cannot be encoded, or a
    /// persistence error if it cannot be written.
    pub async fn write_report(&self, dir: &Path) -> Result<PathBuf> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| ExtractError::Export(format!("Failed to encode summary: {e}")))?;
        let path = dir.join(PROCESSING_SUMMARY_FILE);
        write_atomic(&path, &json).await?;
        tracing::info!(path = %path.display(), "Processing summary saved");
        Ok(path)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            state = %self.state,
            total_identifiers = self.statistics.total_identifiers,
            total_api_calls = self.statistics.total_api_calls,
            successful = self.statistics.successful,
            not_found = self.statistics.not_found,
            client_errors = self.statistics.client_errors,
            exhausted_retries = self.statistics.exhausted_retries(),
            retries = self.statistics.retries,
            rate_limit_hits = self.statistics.rate_limit_hits,
            validation_errors = self.statistics.validation_errors,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Extraction finished"
        );

        if self.interrupted {
            tracing::warn!(
                reason = self.shutdown_reason.as_deref().unwrap_or("shutdown signal"),
                "Extraction was interrupted; re-run to resume"
            );
        }

        for error in &self.errors {
            tracing::warn!(
                error_type = ?error.error_type,
                message = %error.message,
                context = error.context.as_deref().unwrap_or_default(),
                "Run error"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_summary_creation() {
        let summary = RunSummary::new(Uuid::new_v4());
        assert_eq!(summary.state, RunState::Pending);
        assert!(!summary.interrupted);
        assert!(summary.errors.is_empty());
        assert_eq!(summary.duration, Duration::ZERO);
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_is_successful_requires_completed_without_errors() {
        let mut summary = RunSummary::new(Uuid::new_v4());
        summary.state = RunState::Completed;
        assert!(summary.is_successful());

        summary.add_error(
            RunError::new(RunErrorType::Export, "disk full".to_string())
                .with_context("year=2023".to_string()),
        );
        assert!(!summary.is_successful());
        assert_eq!(summary.errors[0].context.as_deref(), Some("year=2023"));
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            RunErrorType::of(&ExtractError::Persistence("x".to_string())),
            RunErrorType::Persistence
        );
        assert_eq!(
            RunErrorType::of(&ExtractError::Configuration("x".to_string())),
            RunErrorType::Configuration
        );
        assert_eq!(
            RunErrorType::of(&ExtractError::Export("x".to_string())),
            RunErrorType::Export
        );
    }

    #[test]
    fn test_year_summary_from_counters() {
        let counters = CounterSnapshot {
            total_identifiers: 10,
            total_api_calls: 10,
            successful: 6,
            not_found: 2,
            client_errors: 1,
            server_errors: 1,
            latency_total_micros: 50_000,
            ..Default::default()
        };
        let year = YearSummary::new(
            PerformanceYear::new(2023).unwrap(),
            CheckpointStatus::Completed,
            counters,
        );
        assert_eq!(year.npis_with_404, 2);
        assert_eq!(year.npis_with_client_error, 1);
        assert_eq!(year.npis_with_other_errors, 1);
        assert_eq!(year.average_time_ms, 5.0);
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let mut summary = RunSummary::new(Uuid::new_v4());
        summary.state = RunState::Completed;
        summary.duration = Duration::from_millis(1500);

        let path = summary.write_report(&dir.path().join("reports")).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(json["state"], "completed");
        assert_eq!(json["duration_secs"], 1.5);
        assert_eq!(json["run_id"], summary.run_id.to_string());
    }
}
