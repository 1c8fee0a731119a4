//! Extraction coordinator - main orchestrator for the extraction run
//!
//! This module coordinates the whole workflow: it plans the remaining
//! (NPI, year) work from the checkpoints, runs one loop per year through
//! the [`BatchProcessor`], exports the staged rows and writes the
//! processing summary.

use crate::adapters::qpp::{QppClient, RateLimiter};
use crate::adapters::storage::{CheckpointStore, RawArchive, StagingArea};
use crate::config::ExtractConfig;
use crate::core::export::{tally_staged, CsvExporter, YearTables};
use crate::core::extract::batch::{BatchProcessor, BatchResult};
use crate::core::extract::summary::{RunError, RunErrorType, RunState, RunSummary, YearSummary};
use crate::core::state::{Checkpoint, StateManager};
use crate::domain::{ExtractError, Npi, PerformanceYear, Result, RunStatistics};
use crate::{log_batch_processing, log_year_start};
use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use uuid::Uuid;

/// Progress of a run, published on every committed batch
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub state: RunState,
    /// Work items finished in this run
    pub processed: u64,
    /// Work items this run has to do
    pub total: u64,
    pub message: String,
}

impl Progress {
    fn pending() -> Self {
        Self {
            state: RunState::Pending,
            processed: 0,
            total: 0,
            message: "Waiting to start".to_string(),
        }
    }

    /// Percentage of work done
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Work plan of one year
#[derive(Debug, Clone)]
pub struct YearPlan {
    pub year: PerformanceYear,
    /// Identifiers in the input
    pub total: u64,
    /// Identifiers completed by earlier runs
    pub resumed: u64,
    pub remaining: u64,
    pub checkpoint: Checkpoint,
}

/// What one year loop ended with
struct YearOutcome {
    checkpoint: Checkpoint,
    result: BatchResult,
    interrupted: bool,
    error: Option<ExtractError>,
    elapsed: Duration,
}

/// Extraction coordinator
pub struct ExtractionCoordinator {
    config: ExtractConfig,
    npis: Vec<Npi>,
    stats: Arc<RunStatistics>,
    state_manager: Arc<StateManager>,
    processor: BatchProcessor,
    shutdown: watch::Receiver<bool>,
    progress: watch::Sender<Progress>,
    processed: AtomicU64,
}

impl ExtractionCoordinator {
    /// Create a new extraction coordinator
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the rate limiter or the HTTP client
    /// cannot be built from `config`.
    pub fn new(
        config: ExtractConfig,
        npis: Vec<Npi>,
        store: Arc<dyn CheckpointStore + Send + Sync>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let years: Vec<PerformanceYear> = config
            .processing
            .years
            .iter()
            .filter_map(|year| PerformanceYear::new(*year).ok())
            .collect();
        let stats = Arc::new(RunStatistics::new(&years));

        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit)?);
        let client = Arc::new(QppClient::new(&config.api, limiter, stats.clone())?);
        let state_manager = Arc::new(StateManager::new(store));

        let raw_archive = config
            .output
            .save_raw_responses
            .then(|| RawArchive::new(config.output.raw_dir()));
        let processor = BatchProcessor::new(
            client,
            StagingArea::new(config.output.staging_dir()),
            state_manager.clone(),
            config.processing.max_workers,
        )
        .with_raw_archive(raw_archive);

        let (progress, _) = watch::channel(Progress::pending());

        Ok(Self {
            config,
            npis,
            stats,
            state_manager,
            processor,
            shutdown,
            progress,
            processed: AtomicU64::new(0),
        })
    }

    /// Receiver of progress updates
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.progress.borrow().state
    }

    pub fn statistics(&self) -> &Arc<RunStatistics> {
        &self.stats
    }

    fn staging(&self) -> &StagingArea {
        self.processor.staging()
    }

    fn publish(&self, state: RunState, message: impl Into<String>) {
        let message = message.into();
        let processed = self.processed.load(Ordering::Relaxed);
        self.progress.send_modify(|progress| {
            progress.state = state;
            progress.processed = processed;
            progress.message = message;
        });
    }

    fn advance(&self, year: PerformanceYear, items: usize) {
        let processed = self.processed.fetch_add(items as u64, Ordering::Relaxed) + items as u64;
        self.progress.send_modify(|progress| {
            progress.processed = processed;
            progress.message = format!("Committed batch for {year}");
        });
    }

    /// Checks the configuration, the identifier set and the years
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any invalid setting, for an empty
    /// or duplicated identifier list, or for an empty, duplicated or
    /// out-of-range year list.
    pub fn validate_inputs(&self) -> Result<Vec<PerformanceYear>> {
        self.config
            .validate()
            .map_err(ExtractError::Configuration)?;

        if self.npis.is_empty() {
            return Err(ExtractError::Configuration(
                "No NPIs to process".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.npis.len());
        if let Some(duplicate) = self.npis.iter().find(|npi| !seen.insert(*npi)) {
            return Err(ExtractError::Configuration(format!(
                "NPI {duplicate} appears more than once"
            )));
        }

        if self.config.processing.years.is_empty() {
            return Err(ExtractError::Configuration(
                "No performance years to process".to_string(),
            ));
        }
        let mut years = Vec::with_capacity(self.config.processing.years.len());
        for year in &self.config.processing.years {
            let year = PerformanceYear::new(*year).map_err(ExtractError::Configuration)?;
            if years.contains(&year) {
                return Err(ExtractError::Configuration(format!(
                    "Performance year {year} appears more than once"
                )));
            }
            years.push(year);
        }
        Ok(years)
    }

    /// Computes the remaining work per year from the checkpoints
    ///
    /// With `state.resume` disabled every year starts from an empty
    /// checkpoint.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid inputs, or a persistence
    /// error if a checkpoint cannot be read.
    pub async fn plan(&self) -> Result<Vec<YearPlan>> {
        let years = self.validate_inputs()?;
        self.plan_years(&years).await
    }

    async fn plan_years(&self, years: &[PerformanceYear]) -> Result<Vec<YearPlan>> {
        let total = self.npis.len() as u64;
        let mut plans = Vec::with_capacity(years.len());

        for &year in years {
            let checkpoint = if self.config.state.resume {
                self.state_manager.load_or_new(year).await?
            } else {
                Checkpoint::new(year)
            };
            let resumed = self.npis.iter().filter(|npi| checkpoint.is_done(npi)).count() as u64;
            plans.push(YearPlan {
                year,
                total,
                resumed,
                remaining: total - resumed,
                checkpoint,
            });
        }

        Ok(plans)
    }

    /// Execute the extraction
    ///
    /// This is the main entry point. It:
    /// 1. Validates the identifiers and years
    /// 2. Clears earlier state unless resuming
    /// 3. Plans the remaining work from the checkpoints and restores their
    ///    counters
    /// 4. Runs the year loops, concurrently when `parallel_years` is set
    /// 5. Exports the staged rows when every year completed
    /// 6. Writes the processing summary
    ///
    /// Per-item failures are counted and never fail the run. A staging or
    /// checkpoint failure ends the run in [`RunState::Failed`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the inputs are invalid; every
    /// later failure is reported on the returned summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new(Uuid::new_v4());

        let years = match self.validate_inputs() {
            Ok(years) => years,
            Err(e) => {
                tracing::error!(error = %e, "Invalid extraction inputs");
                self.publish(RunState::Failed, e.to_string());
                return Err(e);
            }
        };

        tracing::info!(
            run_id = %summary.run_id,
            npis = self.npis.len(),
            years = ?self.config.processing.years,
            parallel_years = self.config.processing.parallel_years,
            "Starting extraction"
        );
        summary.state = RunState::Running;
        self.publish(RunState::Running, "Planning work");

        let plans = match self.prepare(&years).await {
            Ok(plans) => plans,
            Err(e) => {
                tracing::error!(error = %e, "Failed to prepare extraction");
                summary.add_error(RunError::from_error(&e));
                return Ok(self.finish(summary, &years, Vec::new(), start_time).await);
            }
        };

        let total: u64 = plans.iter().map(|plan| plan.remaining).sum();
        self.progress.send_modify(|progress| progress.total = total);
        self.publish(RunState::Running, format!("{total} work items to process"));

        let outcomes = if self.config.processing.parallel_years {
            join_all(plans.iter().map(|plan| self.run_year(plan.clone()))).await
        } else {
            let mut outcomes = Vec::with_capacity(plans.len());
            for plan in &plans {
                outcomes.push(self.run_year(plan.clone()).await);
            }
            outcomes
        };

        let mut resolved = Vec::with_capacity(plans.len());
        for (plan, outcome) in plans.into_iter().zip(outcomes) {
            if let Some(e) = &outcome.error {
                summary.add_error(
                    RunError::from_error(e).with_context(format!("year={}", plan.year)),
                );
            }
            if outcome.interrupted {
                summary.interrupted = true;
            }
            resolved.push((plan, outcome));
        }

        Ok(self.finish(summary, &years, resolved, start_time).await)
    }

    /// Clears or plans state and marks every year as started
    async fn prepare(&self, years: &[PerformanceYear]) -> Result<Vec<YearPlan>> {
        if !self.config.state.resume {
            tracing::info!("Resume disabled - clearing checkpoints and staged rows");
            for &year in years {
                self.state_manager.clear(year).await?;
                self.staging().clear(year).await?;
            }
        }

        let mut plans = self.plan_years(years).await?;
        for plan in &mut plans {
            let year = plan.year;
            let discarded = self
                .staging()
                .discard_from(year, plan.checkpoint.batches_committed)
                .await?;
            if discarded > 0 {
                tracing::info!(year = %year, discarded, "Removed batches staged after the last checkpoint");
            }

            self.stats.restore(year, &plan.checkpoint.counters);
            self.stats.set_total_identifiers(year, plan.total);

            plan.checkpoint.mark_started();
            self.state_manager.save(&plan.checkpoint).await?;

            log_year_start!(year, plan.remaining, plan.resumed);
        }
        Ok(plans)
    }

    /// Runs every remaining batch of one year
    async fn run_year(&self, plan: YearPlan) -> YearOutcome {
        let started = Instant::now();
        let year = plan.year;
        let mut checkpoint = plan.checkpoint;
        let mut result = BatchResult::new();
        let mut interrupted = false;
        let mut error = None;

        let pending: Vec<Npi> = self
            .npis
            .iter()
            .filter(|npi| !checkpoint.is_done(npi))
            .cloned()
            .collect();
        let batches: Vec<&[Npi]> = pending.chunks(self.config.processing.batch_size).collect();
        let total_batches = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            if *self.shutdown.borrow() {
                interrupted = true;
                break;
            }
            log_batch_processing!(index + 1, total_batches);

            match self
                .processor
                .process_batch(
                    year,
                    batch,
                    self.config.api.run_number,
                    &self.shutdown,
                    &mut checkpoint,
                )
                .await
            {
                Ok(batch_result) => {
                    self.advance(year, batch_result.processed);
                    result.merge(&batch_result);
                    if batch_result.was_interrupted() {
                        interrupted = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(year = %year, error = %e, "Batch failed");
                    error = Some(e);
                    break;
                }
            }
        }

        if error.is_some() {
            checkpoint.mark_failed();
        } else if interrupted {
            tracing::warn!(
                year = %year,
                processed = result.processed,
                remaining = pending.len() - result.processed,
                "Year interrupted by shutdown signal"
            );
            checkpoint.mark_interrupted();
        } else {
            checkpoint.mark_completed();
        }

        if let Err(e) = self.state_manager.save(&checkpoint).await {
            tracing::error!(year = %year, error = %e, "Failed to save final checkpoint");
            error.get_or_insert(e);
        }

        tracing::info!(
            year = %year,
            status = %checkpoint.status,
            processed = result.processed,
            successful = result.successful,
            not_found = result.not_found,
            failed = result.failed,
            rows = result.rows,
            "Year finished"
        );

        YearOutcome {
            checkpoint,
            result,
            interrupted,
            error,
            elapsed: started.elapsed(),
        }
    }

    /// Settles the final state, exports, and writes the report
    async fn finish(
        &self,
        mut summary: RunSummary,
        years: &[PerformanceYear],
        outcomes: Vec<(YearPlan, YearOutcome)>,
        start_time: Instant,
    ) -> RunSummary {
        summary.state = if !summary.errors.is_empty() {
            RunState::Failed
        } else if summary.interrupted {
            summary.shutdown_reason = Some("shutdown signal received".to_string());
            RunState::Interrupted
        } else {
            RunState::Completed
        };

        let tables = if outcomes.is_empty() {
            BTreeMap::new()
        } else {
            self.collect_tables(&mut summary, years).await
        };

        for (plan, outcome) in &outcomes {
            summary
                .years
                .push(self.year_summary(plan, outcome, tables.get(&plan.year)));
        }

        for &year in years {
            match self.staging().issues(year) {
                Ok(issues) => summary.validation_issues.extend(issues),
                Err(e) => {
                    tracing::warn!(year = %year, error = %e, "Failed to read staged validation issues");
                    summary.add_error(
                        RunError::from_error(&e).with_context(format!("year={year}")),
                    );
                }
            }
        }

        summary.statistics = self.stats.overall();
        summary.finished_at = Some(Utc::now());
        summary = summary.with_duration(start_time.elapsed());

        if let Err(e) = summary.write_report(&self.config.output.reports_dir()).await {
            tracing::error!(error = %e, "Failed to write processing summary");
            summary.add_error(RunError::new(
                RunErrorType::Export,
                format!("Failed to write processing summary: {e}"),
            ));
        }

        summary.log_summary();
        self.publish(summary.state, format!("Extraction {}", summary.state));
        summary
    }

    /// Exports the staged rows of a completed run, or only counts them
    async fn collect_tables(
        &self,
        summary: &mut RunSummary,
        years: &[PerformanceYear],
    ) -> BTreeMap<PerformanceYear, YearTables> {
        let staging = self.staging().clone();
        let years = years.to_vec();

        let export = summary.state == RunState::Completed && self.config.output.generate_csv;
        let exporter = CsvExporter::new(self.config.output.csv_dir());
        if export {
            tracing::info!(dir = %exporter.dir().display(), "Exporting CSV tables");
        }

        let joined = tokio::task::spawn_blocking(move || {
            if export {
                exporter.export(&staging, &years)
            } else {
                years
                    .iter()
                    .map(|year| tally_staged(&staging, *year))
                    .collect()
            }
        })
        .await;

        let tallies = match joined {
            Ok(Ok(tallies)) => tallies,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to export staged rows");
                summary.add_error(RunError::from_error(&e));
                if export {
                    summary.state = RunState::Failed;
                }
                return BTreeMap::new();
            }
            Err(e) => {
                summary.add_error(RunError::new(
                    RunErrorType::Unknown,
                    format!("Export task failed: {e}"),
                ));
                summary.state = RunState::Failed;
                return BTreeMap::new();
            }
        };

        for tables in &tallies {
            summary.csv_files.extend(tables.files.iter().cloned());
        }
        tallies
            .into_iter()
            .map(|tables| (tables.year, tables))
            .collect()
    }

    fn year_summary(
        &self,
        plan: &YearPlan,
        outcome: &YearOutcome,
        tables: Option<&YearTables>,
    ) -> YearSummary {
        let checkpoint = &outcome.checkpoint;
        let counters = self.stats.year(plan.year).unwrap_or_default();
        let completed = self
            .npis
            .iter()
            .filter(|npi| checkpoint.is_done(npi))
            .count() as u64;

        let mut year = YearSummary::new(plan.year, checkpoint.status, counters);
        year.resumed = plan.resumed;
        year.processed = outcome.result.processed as u64;
        year.remaining = plan.total - completed;
        year.batches_committed = checkpoint.batches_committed;
        year.total_time_secs = outcome.elapsed.as_secs_f64();

        if let Some(tables) = tables {
            year.record_counts = tables.row_counts();
            year.field_completeness = tables
                .tables
                .iter()
                .map(|(table, stats)| {
                    let columns = stats
                        .completeness()
                        .into_iter()
                        .map(|(column, pct)| (column.to_string(), pct))
                        .collect();
                    (table.to_string(), columns)
                })
                .collect();
        }
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryCheckpointStore;
    use crate::domain::CounterSnapshot;

    fn npi(value: &str) -> Npi {
        Npi::new(value).unwrap()
    }

    fn build(npis: Vec<Npi>, years: Vec<u16>, store: Arc<MemoryCheckpointStore>) -> ExtractionCoordinator {
        let mut config = ExtractConfig::default();
        config.processing.years = years;
        build_with(config, npis, store)
    }

    fn build_with(
        config: ExtractConfig,
        npis: Vec<Npi>,
        store: Arc<MemoryCheckpointStore>,
    ) -> ExtractionCoordinator {
        let (_tx, rx) = watch::channel(false);
        ExtractionCoordinator::new(config, npis, store, rx).unwrap()
    }

    #[test]
    fn test_validate_rejects_empty_npis() {
        let coordinator = build(Vec::new(), vec![2023], Arc::default());
        let err = coordinator.validate_inputs().unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_duplicate_npis() {
        let coordinator = build(
            vec![npi("1234567890"), npi("1234567890")],
            vec![2023],
            Arc::default(),
        );
        assert!(coordinator.validate_inputs().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_years() {
        let coordinator = build(vec![npi("1234567890")], vec![2016], Arc::default());
        assert!(coordinator.validate_inputs().is_err());

        let coordinator = build(vec![npi("1234567890")], vec![2023, 2023], Arc::default());
        assert!(coordinator.validate_inputs().is_err());

        let coordinator = build(vec![npi("1234567890")], Vec::new(), Arc::default());
        assert!(coordinator.validate_inputs().is_err());
    }

    #[test]
    fn test_validate_rejects_invalid_config() {
        let mut config = ExtractConfig::default();
        config.processing.years = vec![2023];
        config.processing.batch_size = 0;
        let coordinator = build_with(config, vec![npi("1234567890")], Arc::default());

        let err = coordinator.validate_inputs().unwrap_err();
        assert!(err.to_string().contains("processing.batch_size"));
    }

    #[tokio::test]
    async fn test_run_with_zero_batch_size_fails() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let mut config = ExtractConfig::default();
        config.processing.years = vec![2023];
        config.processing.batch_size = 0;
        let coordinator = build_with(config, vec![npi("1234567890")], store.clone());

        let err = coordinator.run().await.unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
        assert_eq!(coordinator.state(), RunState::Failed);
        let year = PerformanceYear::new(2023).unwrap();
        assert!(store.load(year).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_invalid_inputs() {
        let coordinator = build(Vec::new(), vec![2023], Arc::default());
        let err = coordinator.run().await.unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
        assert_eq!(coordinator.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn test_plan_subtracts_completed() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let y2023 = PerformanceYear::new(2023).unwrap();
        let mut checkpoint = Checkpoint::new(y2023);
        checkpoint.record_batch([npi("1234567890")], CounterSnapshot::default());
        store.commit(&checkpoint).await.unwrap();

        let coordinator = build(
            vec![npi("1234567890"), npi("0000000000")],
            vec![2023, 2024],
            store,
        );
        let plans = coordinator.plan().await.unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].year, y2023);
        assert_eq!(plans[0].total, 2);
        assert_eq!(plans[0].resumed, 1);
        assert_eq!(plans[0].remaining, 1);
        assert_eq!(plans[1].remaining, 2);
    }

    #[test]
    fn test_initial_progress() {
        let coordinator = build(vec![npi("1234567890")], vec![2023], Arc::default());
        let progress = coordinator.subscribe().borrow().clone();
        assert_eq!(progress.state, RunState::Pending);
        assert_eq!(progress.percent(), 100.0);
        assert_eq!(coordinator.state(), RunState::Pending);
    }
}
