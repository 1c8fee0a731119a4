//! Integration tests for graceful shutdown functionality
//!
//! These tests verify that:
//! - Shutdown signals reach every receiver
//! - Checkpoints are marked interrupted and keep their progress
//! - A run stopped before any lookup ends interrupted without exporting
//! - The saved progress is picked up by the next run

use qpp_extract::adapters::storage::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use qpp_extract::cli::commands::extract::exit_code;
use qpp_extract::cli::EXIT_INTERRUPTED;
use qpp_extract::config::{ExtractConfig, LoggingConfig};
use qpp_extract::core::extract::summary::PROCESSING_SUMMARY_FILE;
use qpp_extract::core::extract::{ExtractionCoordinator, RunState};
use qpp_extract::core::state::{Checkpoint, CheckpointStatus};
use qpp_extract::domain::{CounterSnapshot, Npi, PerformanceYear};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

fn npi(value: &str) -> Npi {
    Npi::new(value).unwrap()
}

fn config_for(dir: &Path) -> ExtractConfig {
    let mut config = ExtractConfig::default();
    // Nothing listens here; an interrupted run must never connect
    config.api.base_url = "http://127.0.0.1:9".to_string();
    config.processing.years = vec![2023, 2024];
    config.output.base_dir = dir.join("outputs").to_string_lossy().to_string();
    config.state.checkpoint_dir = dir.join("checkpoints").to_string_lossy().to_string();
    config.logging = LoggingConfig::console_only();
    config
}

#[tokio::test]
async fn test_shutdown_signal_channel_creation() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Initially, shutdown should be false
    assert!(!*shutdown_rx.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx.borrow());
}

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let mut shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    let waiter = tokio::spawn(async move {
        shutdown_rx2.changed().await.unwrap();
        *shutdown_rx2.borrow()
    });

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(waiter.await.unwrap());
}

#[test]
fn test_checkpoint_interrupted_status() {
    let year = PerformanceYear::new(2024).unwrap();
    let mut checkpoint = Checkpoint::new(year);
    assert_eq!(checkpoint.status, CheckpointStatus::NotStarted);

    checkpoint.mark_started();
    assert_eq!(checkpoint.status, CheckpointStatus::InProgress);

    checkpoint.record_batch([npi("1234567890")], CounterSnapshot::default());
    checkpoint.mark_interrupted();

    assert_eq!(checkpoint.status, CheckpointStatus::Interrupted);
    assert!(!checkpoint.is_completed());
    assert!(checkpoint.is_done(&npi("1234567890")));
    assert_eq!(checkpoint.batches_committed, 1);
}

#[tokio::test]
async fn test_interrupted_checkpoint_survives_reload() {
    let dir = TempDir::new().unwrap();
    let store = FileCheckpointStore::new(dir.path());
    let year = PerformanceYear::new(2023).unwrap();

    let mut checkpoint = Checkpoint::new(year);
    checkpoint.mark_started();
    let counters = CounterSnapshot {
        total_api_calls: 2,
        successful: 1,
        not_found: 1,
        ..CounterSnapshot::default()
    };
    checkpoint.record_batch([npi("1234567890"), npi("1987654321")], counters);
    checkpoint.mark_interrupted();
    store.commit(&checkpoint).await.unwrap();

    let loaded = store.load(year).await.unwrap().unwrap();
    assert_eq!(loaded.status, CheckpointStatus::Interrupted);
    assert_eq!(loaded.completed_count(), 2);
    assert_eq!(loaded.counters.total_api_calls, 2);
    assert_eq!(loaded.counters.not_found, 1);
}

#[tokio::test]
async fn test_run_with_shutdown_requested_is_interrupted() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());
    let output = config.output.clone();
    let store = Arc::new(MemoryCheckpointStore::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi("1234567890"), npi("1987654321")],
        store.clone(),
        shutdown_rx,
    )
    .unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.state, RunState::Interrupted);
    assert!(summary.interrupted);
    assert!(summary.shutdown_reason.is_some());
    assert!(summary.errors.is_empty());
    assert!(!summary.is_successful());
    assert_eq!(summary.statistics.total_api_calls, 0);
    assert_eq!(summary.statistics.http_attempts, 0);
    assert_eq!(exit_code(&summary), EXIT_INTERRUPTED);
    assert_eq!(coordinator.state(), RunState::Interrupted);

    for year_summary in &summary.years {
        assert_eq!(year_summary.status, CheckpointStatus::Interrupted);
        assert_eq!(year_summary.processed, 0);
        assert_eq!(year_summary.remaining, 2);
    }

    for year in [2023, 2024] {
        let year = PerformanceYear::new(year).unwrap();
        let checkpoint = store.load(year).await.unwrap().unwrap();
        assert_eq!(checkpoint.status, CheckpointStatus::Interrupted);
        assert_eq!(checkpoint.completed_count(), 0);
    }

    // No export for an interrupted run, but the report is always written
    assert!(summary.csv_files.is_empty());
    assert!(!output.csv_dir().exists());
    assert!(output.reports_dir().join(PROCESSING_SUMMARY_FILE).exists());
}

#[tokio::test]
async fn test_finished_year_is_not_interrupted() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path());
    config.processing.years = vec![2023];
    let store = Arc::new(MemoryCheckpointStore::new());

    // Every NPI for the year was committed by an earlier run
    let year = PerformanceYear::new(2023).unwrap();
    let mut checkpoint = Checkpoint::new(year);
    checkpoint.record_batch(
        [npi("1234567890")],
        CounterSnapshot {
            total_api_calls: 1,
            successful: 1,
            ..CounterSnapshot::default()
        },
    );
    checkpoint.mark_interrupted();
    store.commit(&checkpoint).await.unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let coordinator =
        ExtractionCoordinator::new(config, vec![npi("1234567890")], store.clone(), shutdown_rx)
            .unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.statistics.total_api_calls, 1);
    assert_eq!(summary.statistics.successful, 1);

    let year_summary = &summary.years[0];
    assert_eq!(year_summary.resumed, 1);
    assert_eq!(year_summary.remaining, 0);

    let saved = store.load(year).await.unwrap().unwrap();
    assert_eq!(saved.status, CheckpointStatus::Completed);
}
