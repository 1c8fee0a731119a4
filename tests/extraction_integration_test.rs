//! End-to-end extraction tests against a mock QPP Eligibility API
//!
//! Each test starts a mockito server, points the client at it and runs the
//! coordinator over temporary output and checkpoint directories.

use mockito::{Matcher, Server, ServerGuard};
use qpp_extract::adapters::storage::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use qpp_extract::config::{ExtractConfig, LoggingConfig};
use qpp_extract::core::export::{DATA_DICTIONARY_FILE, EXPORT_SUMMARY_FILE};
use qpp_extract::core::extract::summary::PROCESSING_SUMMARY_FILE;
use qpp_extract::core::extract::{ExtractionCoordinator, RunState};
use qpp_extract::core::state::CheckpointStatus;
use qpp_extract::domain::{CounterSnapshot, Npi, PerformanceYear};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

const ACCEPT: &str = "application/vnd.qpp.cms.gov.v6+json";
const FOUND_NPI: &str = "1234567890";
const MISSING_NPI: &str = "1987654321";

fn npi(value: &str) -> Npi {
    Npi::new(value).unwrap()
}

fn year(value: u16) -> PerformanceYear {
    PerformanceYear::new(value).unwrap()
}

fn test_config(server: &ServerGuard, dir: &Path, years: Vec<u16>) -> ExtractConfig {
    let mut config = ExtractConfig::default();
    config.api.base_url = server.url();
    config.api.retry.initial_delay_ms = 10;
    config.api.retry.max_delay_ms = 50;
    config.api.retry.jitter_ratio = 0.0;
    config.rate_limit.requests_per_second = 100.0;
    config.rate_limit.burst = 100;
    config.processing.years = years;
    config.processing.batch_size = 10;
    config.processing.max_workers = 2;
    config.output.base_dir = dir.join("outputs").to_string_lossy().to_string();
    config.state.checkpoint_dir = dir.join("checkpoints").to_string_lossy().to_string();
    config.logging = LoggingConfig::console_only();
    config
}

fn eligibility_record(npi: &str, group_eligible: Value) -> String {
    json!({
        "data": {
            "npi": npi,
            "firstName": "Jane",
            "lastName": "Doe",
            "nationalProviderIdentifierType": 1,
            "newlyEnrolled": false,
            "qpStatus": "N",
            "specialty": {
                "specialtyDescription": "Internal Medicine",
                "typeDescription": "Physician"
            },
            "organizations": [{
                "TIN": "XXXXX1234",
                "prvdrOrgName": "Example Clinic",
                "city": "Baltimore",
                "state": "MD",
                "individualScenario": {
                    "isEligible": {"individual": true},
                    "specialty": {"specialtyDescription": "Internal Medicine"}
                },
                "groupScenario": {
                    "isEligible": {"group": group_eligible},
                    "aggregationLevel": 2
                }
            }]
        }
    })
    .to_string()
}

async fn mock_lookup(
    server: &mut ServerGuard,
    npi: &str,
    year: u16,
    status: usize,
    body: String,
    hits: usize,
) -> mockito::Mock {
    server
        .mock("GET", format!("/api/eligibility/npi/{npi}").as_str())
        .match_query(Matcher::UrlEncoded("year".into(), year.to_string()))
        .match_header("accept", ACCEPT)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

fn found_body() -> String {
    eligibility_record(FOUND_NPI, json!(true))
}

fn not_found_body() -> String {
    json!({"error": {"type": "NotFound", "message": "NPI not found"}}).to_string()
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|record| record.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_found_and_missing_npis() {
    let mut server = Server::new_async().await;
    let found = mock_lookup(&mut server, FOUND_NPI, 2024, 200, found_body(), 1).await;
    let missing = mock_lookup(&mut server, MISSING_NPI, 2024, 404, not_found_body(), 1).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path(), vec![2024]);
    let output = config.output.clone();
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI), npi(MISSING_NPI)],
        Arc::new(MemoryCheckpointStore::new()),
        rx,
    )
    .unwrap();

    let summary = coordinator.run().await.unwrap();

    found.assert_async().await;
    missing.assert_async().await;

    assert_eq!(summary.state, RunState::Completed);
    assert!(summary.is_successful());
    assert!(summary.errors.is_empty());
    assert_eq!(summary.statistics.total_api_calls, 2);
    assert_eq!(summary.statistics.successful, 1);
    assert_eq!(summary.statistics.not_found, 1);
    assert_eq!(summary.statistics.retries, 0);

    let year_summary = summary.year(year(2024)).unwrap();
    assert_eq!(year_summary.status, CheckpointStatus::Completed);
    assert_eq!(year_summary.processed, 2);
    assert_eq!(year_summary.remaining, 0);
    assert_eq!(year_summary.npis_with_404, 1);
    assert_eq!(year_summary.record_counts.get("providers"), Some(&1));
    assert_eq!(year_summary.record_counts.get("organizations"), Some(&1));
    assert_eq!(year_summary.record_counts.get("group_scenarios"), Some(&1));

    let csv_dir = output.csv_dir();
    let (headers, rows) = read_csv(&csv_dir.join("providers_2024.csv"));
    assert_eq!(&headers[..2], &["npi".to_string(), "year".to_string()]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], FOUND_NPI);
    assert_eq!(rows[0][1], "2024");

    let (_, organizations) = read_csv(&csv_dir.join("organizations_2024.csv"));
    assert_eq!(organizations.len(), 1);
    let (_, apms) = read_csv(&csv_dir.join("apms_2024.csv"));
    assert!(apms.is_empty());

    assert!(csv_dir.join(DATA_DICTIONARY_FILE).exists());
    assert!(csv_dir.join(EXPORT_SUMMARY_FILE).exists());
    assert_eq!(summary.csv_files.len(), 6);

    assert!(output.raw_dir().join("2024").join(format!("{FOUND_NPI}.json")).exists());
    assert!(!output.raw_dir().join("2024").join(format!("{MISSING_NPI}.json")).exists());

    let report: Value = serde_json::from_str(
        &std::fs::read_to_string(output.reports_dir().join(PROCESSING_SUMMARY_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(report["state"], "completed");
    assert_eq!(report["statistics"]["total_api_calls"], 2);
}

#[tokio::test]
async fn test_rate_limited_lookup_is_retried() {
    let mut server = Server::new_async().await;
    let limited = mock_lookup(
        &mut server,
        FOUND_NPI,
        2023,
        429,
        json!({"error": {"type": "RateLimit", "message": "slow down"}}).to_string(),
        3,
    )
    .await;
    let ok = mock_lookup(&mut server, FOUND_NPI, 2023, 200, found_body(), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path(), vec![2023]);
    config.output.save_raw_responses = false;
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI)],
        Arc::new(MemoryCheckpointStore::new()),
        rx,
    )
    .unwrap();

    let summary = coordinator.run().await.unwrap();

    limited.assert_async().await;
    ok.assert_async().await;

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.statistics.total_api_calls, 1);
    assert_eq!(summary.statistics.http_attempts, 4);
    assert_eq!(summary.statistics.retries, 3);
    assert_eq!(summary.statistics.rate_limit_hits, 3);
    assert_eq!(summary.statistics.successful, 1);
}

#[tokio::test]
async fn test_exhausted_retries_count_as_completed() {
    let mut server = Server::new_async().await;
    let unavailable = mock_lookup(
        &mut server,
        FOUND_NPI,
        2023,
        503,
        json!({"error": {"type": "Unavailable", "message": "maintenance"}}).to_string(),
        4,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path(), vec![2023]);
    let store = Arc::new(MemoryCheckpointStore::new());
    let (_tx, rx) = watch::channel(false);
    let coordinator =
        ExtractionCoordinator::new(config, vec![npi(FOUND_NPI)], store.clone(), rx).unwrap();

    let summary = coordinator.run().await.unwrap();

    unavailable.assert_async().await;
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.statistics.server_errors, 1);
    assert_eq!(summary.statistics.http_attempts, 4);

    let year_summary = summary.year(year(2023)).unwrap();
    assert_eq!(year_summary.npis_with_other_errors, 1);
    assert_eq!(year_summary.remaining, 0);

    let checkpoint = store.load(year(2023)).await.unwrap().unwrap();
    assert!(checkpoint.is_done(&npi(FOUND_NPI)));
    assert_eq!(checkpoint.status, CheckpointStatus::Completed);
}

#[tokio::test]
async fn test_invalid_field_becomes_validation_issue() {
    let mut server = Server::new_async().await;
    let _found = mock_lookup(
        &mut server,
        FOUND_NPI,
        2024,
        200,
        eligibility_record(FOUND_NPI, json!("false")),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path(), vec![2024]);
    let csv_dir = config.output.csv_dir();
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI)],
        Arc::new(MemoryCheckpointStore::new()),
        rx,
    )
    .unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.validation_issues.len(), 1);
    let issue = &summary.validation_issues[0];
    assert_eq!(issue.npi, FOUND_NPI);
    assert_eq!(issue.year, 2024);
    assert_eq!(issue.field, "isEligible_group");
    assert_eq!(issue.value.as_deref(), Some("\"false\""));
    assert_eq!(summary.statistics.validation_errors, 1);

    // The row is still emitted with the invalid value left empty
    let (headers, rows) = read_csv(&csv_dir.join("group_scenarios_2024.csv"));
    let column = headers.iter().position(|h| h == "isEligible_group").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][column], "");
}

#[tokio::test]
async fn test_resume_skips_completed_npis() {
    let mut server = Server::new_async().await;
    let first = mock_lookup(&mut server, FOUND_NPI, 2024, 200, found_body(), 1).await;
    let second = mock_lookup(&mut server, MISSING_NPI, 2024, 404, not_found_body(), 1).await;

    let dir = TempDir::new().unwrap();
    let checkpoints = dir.path().join("checkpoints");

    // First run only knows one NPI
    let config = test_config(&server, dir.path(), vec![2024]);
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI)],
        Arc::new(FileCheckpointStore::new(&checkpoints)),
        rx.clone(),
    )
    .unwrap();
    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.statistics.total_api_calls, 1);

    // Second run resumes from the checkpoint and only looks up the new NPI
    let config = test_config(&server, dir.path(), vec![2024]);
    let output = config.output.clone();
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI), npi(MISSING_NPI)],
        Arc::new(FileCheckpointStore::new(&checkpoints)),
        rx,
    )
    .unwrap();

    let plans = coordinator.plan().await.unwrap();
    assert_eq!(plans[0].resumed, 1);
    assert_eq!(plans[0].remaining, 1);

    let summary = coordinator.run().await.unwrap();

    first.assert_async().await;
    second.assert_async().await;

    assert_eq!(summary.state, RunState::Completed);
    // Counters restored from the checkpoint plus this run's lookups
    assert_eq!(summary.statistics.total_api_calls, 2);
    assert_eq!(summary.statistics.successful, 1);
    assert_eq!(summary.statistics.not_found, 1);

    let year_summary = summary.year(year(2024)).unwrap();
    assert_eq!(year_summary.resumed, 1);
    assert_eq!(year_summary.processed, 1);
    assert_eq!(year_summary.batches_committed, 2);
    assert_eq!(year_summary.record_counts.get("providers"), Some(&1));

    // Rows from both runs land in the export
    let (_, rows) = read_csv(&output.csv_dir().join("providers_2024.csv"));
    assert_eq!(rows.len(), 1);

    let store = FileCheckpointStore::new(&checkpoints);
    let checkpoint = store.load(year(2024)).await.unwrap().unwrap();
    assert_eq!(checkpoint.completed_count(), 2);
    assert_eq!(checkpoint.counters.total_api_calls, 2);
}

#[tokio::test]
async fn test_fresh_run_ignores_checkpoints() {
    let mut server = Server::new_async().await;
    let found = mock_lookup(&mut server, FOUND_NPI, 2024, 200, found_body(), 2).await;

    let dir = TempDir::new().unwrap();
    let checkpoints = dir.path().join("checkpoints");
    let (_tx, rx) = watch::channel(false);

    for resume in [true, false] {
        let mut config = test_config(&server, dir.path(), vec![2024]);
        config.state.resume = resume;
        let coordinator = ExtractionCoordinator::new(
            config,
            vec![npi(FOUND_NPI)],
            Arc::new(FileCheckpointStore::new(&checkpoints)),
            rx.clone(),
        )
        .unwrap();
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.statistics.total_api_calls, 1);
        assert_eq!(summary.year(year(2024)).unwrap().resumed, 0);
    }

    found.assert_async().await;
}

#[tokio::test]
async fn test_years_run_sequentially() {
    let mut server = Server::new_async().await;
    let y2023 = mock_lookup(&mut server, FOUND_NPI, 2023, 200, found_body(), 1).await;
    let y2024 = mock_lookup(&mut server, FOUND_NPI, 2024, 404, not_found_body(), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path(), vec![2023, 2024]);
    config.processing.parallel_years = false;
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI)],
        Arc::new(MemoryCheckpointStore::new()),
        rx,
    )
    .unwrap();

    let progress = coordinator.subscribe();
    let summary = coordinator.run().await.unwrap();

    y2023.assert_async().await;
    y2024.assert_async().await;

    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.years.len(), 2);
    assert_eq!(summary.year(year(2023)).unwrap().successful, 1);
    assert_eq!(summary.year(year(2024)).unwrap().npis_with_404, 1);

    let last = progress.borrow().clone();
    assert_eq!(last.state, RunState::Completed);
    assert_eq!(last.processed, 2);
    assert_eq!(last.total, 2);
}

#[tokio::test]
async fn test_years_run_in_parallel() {
    let mut server = Server::new_async().await;
    let mocks = vec![
        mock_lookup(&mut server, FOUND_NPI, 2023, 200, found_body(), 1).await,
        mock_lookup(&mut server, MISSING_NPI, 2023, 404, not_found_body(), 1).await,
        mock_lookup(&mut server, FOUND_NPI, 2024, 404, not_found_body(), 1).await,
        mock_lookup(
            &mut server,
            MISSING_NPI,
            2024,
            200,
            eligibility_record(MISSING_NPI, json!(true)),
            1,
        )
        .await,
    ];

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path(), vec![2023, 2024]);
    config.processing.parallel_years = true;
    config.processing.batch_size = 1;
    let csv_dir = config.output.csv_dir();
    let store = Arc::new(MemoryCheckpointStore::new());
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI), npi(MISSING_NPI)],
        store.clone(),
        rx,
    )
    .unwrap();

    let summary = coordinator.run().await.unwrap();

    for mock in &mocks {
        mock.assert_async().await;
    }
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.years.len(), 2);

    // Each year keeps its own checkpoint and counters
    for y in [2023, 2024] {
        let year_summary = summary.year(year(y)).unwrap();
        assert_eq!(year_summary.status, CheckpointStatus::Completed);
        assert_eq!(year_summary.processed, 2);
        assert_eq!(year_summary.batches_committed, 2);
        assert_eq!(year_summary.successful, 1);
        assert_eq!(year_summary.npis_with_404, 1);
        assert_eq!(year_summary.record_counts.get("providers"), Some(&1));

        let checkpoint = store.load(year(y)).await.unwrap().unwrap();
        assert_eq!(checkpoint.status, CheckpointStatus::Completed);
        assert_eq!(checkpoint.completed_count(), 2);
        assert_eq!(checkpoint.counters.total_api_calls, 2);
        assert_eq!(checkpoint.counters.successful, 1);
        assert_eq!(checkpoint.counters.not_found, 1);

        let (_, rows) = read_csv(&csv_dir.join(format!("providers_{y}.csv")));
        assert_eq!(rows.len(), 1);
    }

    // Overall totals are the sum of the years
    let per_year = coordinator.statistics().years();
    assert_eq!(per_year.len(), 2);
    let overall = &summary.statistics;
    let sum = |field: fn(&CounterSnapshot) -> u64| -> u64 {
        per_year.values().map(field).sum()
    };
    assert_eq!(overall.total_api_calls, 4);
    assert_eq!(overall.total_api_calls, sum(|c| c.total_api_calls));
    assert_eq!(overall.http_attempts, sum(|c| c.http_attempts));
    assert_eq!(overall.successful, sum(|c| c.successful));
    assert_eq!(overall.not_found, sum(|c| c.not_found));
    assert_eq!(overall.successful, 2);
    assert_eq!(overall.not_found, 2);
}

fn resume_npis() -> Vec<&'static str> {
    vec!["1000000001", "1000000002", "1000000003", "1000000004", "1000000005"]
}

async fn mock_resume_lookups(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let mut mocks = Vec::new();
    for (index, value) in resume_npis().into_iter().enumerate() {
        // Every NPI must be looked up exactly once across all runs
        let mock = if index % 2 == 0 {
            let body = eligibility_record(value, json!(true));
            mock_lookup(server, value, 2024, 200, body, 1).await
        } else {
            mock_lookup(server, value, 2024, 404, not_found_body(), 1).await
        };
        mocks.push(mock);
    }
    mocks
}

fn resume_config(server: &ServerGuard, dir: &Path) -> ExtractConfig {
    let mut config = test_config(server, dir, vec![2024]);
    config.processing.batch_size = 1;
    config.processing.max_workers = 1;
    config
}

#[tokio::test]
async fn test_resume_after_interrupted_run() {
    let npis: Vec<Npi> = resume_npis().into_iter().map(npi).collect();

    // Reference run without interruption
    let mut reference_server = Server::new_async().await;
    let reference_mocks = mock_resume_lookups(&mut reference_server).await;
    let reference_dir = TempDir::new().unwrap();
    let (_reference_tx, reference_rx) = watch::channel(false);
    let reference = ExtractionCoordinator::new(
        resume_config(&reference_server, reference_dir.path()),
        npis.clone(),
        Arc::new(MemoryCheckpointStore::new()),
        reference_rx,
    )
    .unwrap()
    .run()
    .await
    .unwrap();
    for mock in &reference_mocks {
        mock.assert_async().await;
    }
    assert_eq!(reference.state, RunState::Completed);

    let mut server = Server::new_async().await;
    let mocks = mock_resume_lookups(&mut server).await;
    let dir = TempDir::new().unwrap();
    let checkpoints = dir.path().join("checkpoints");

    // First run: request shutdown as soon as one batch is committed
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        resume_config(&server, dir.path()),
        npis.clone(),
        Arc::new(FileCheckpointStore::new(&checkpoints)),
        shutdown_rx,
    )
    .unwrap();
    let mut progress = coordinator.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            if progress.borrow().processed >= 1 {
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    });

    let interrupted = coordinator.run().await.unwrap();
    watcher.await.unwrap();

    assert_eq!(interrupted.state, RunState::Interrupted);
    assert!(interrupted.csv_files.is_empty());

    let store = FileCheckpointStore::new(&checkpoints);
    let checkpoint = store.load(year(2024)).await.unwrap().unwrap();
    assert_eq!(checkpoint.status, CheckpointStatus::Interrupted);
    let committed = checkpoint.completed_count();
    assert!(committed >= 1 && committed < npis.len());
    assert_eq!(checkpoint.batches_committed, committed as u64);
    assert_eq!(checkpoint.counters.total_api_calls, committed as u64);

    // Second run picks up the remaining NPIs only
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        resume_config(&server, dir.path()),
        npis.clone(),
        Arc::new(FileCheckpointStore::new(&checkpoints)),
        rx,
    )
    .unwrap();
    let resumed = coordinator.run().await.unwrap();

    for mock in &mocks {
        mock.assert_async().await;
    }
    assert_eq!(resumed.state, RunState::Completed);

    let year_summary = resumed.year(year(2024)).unwrap();
    assert_eq!(year_summary.resumed, committed as u64);
    assert_eq!(year_summary.processed, (npis.len() - committed) as u64);
    assert_eq!(year_summary.batches_committed, npis.len() as u64);

    // The combined runs match the uninterrupted one
    let expected = &reference.statistics;
    let actual = &resumed.statistics;
    assert_eq!(actual.total_api_calls, expected.total_api_calls);
    assert_eq!(actual.http_attempts, expected.http_attempts);
    assert_eq!(actual.successful, expected.successful);
    assert_eq!(actual.not_found, expected.not_found);
    assert_eq!(actual.retries, expected.retries);
    assert_eq!(actual.validation_errors, expected.validation_errors);
    assert_eq!(actual.successful, 3);
    assert_eq!(actual.not_found, 2);

    let reference_year = reference.year(year(2024)).unwrap();
    assert_eq!(year_summary.record_counts, reference_year.record_counts);
    assert_eq!(resumed.csv_files.len(), reference.csv_files.len());

    let checkpoint = store.load(year(2024)).await.unwrap().unwrap();
    assert_eq!(checkpoint.status, CheckpointStatus::Completed);
    assert_eq!(checkpoint.completed_count(), npis.len());
}

#[tokio::test]
async fn test_run_number_is_sent() {
    let mut server = Server::new_async().await;
    let lookup = server
        .mock("GET", format!("/api/eligibility/npi/{FOUND_NPI}").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("year".into(), "2025".into()),
            Matcher::UrlEncoded("runNumber".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(eligibility_record(FOUND_NPI, json!(false)))
        .expect(1)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path(), vec![2025]);
    config.api.run_number = Some(2);
    config.output.generate_csv = false;
    let csv_dir = config.output.csv_dir();
    let (_tx, rx) = watch::channel(false);
    let coordinator = ExtractionCoordinator::new(
        config,
        vec![npi(FOUND_NPI)],
        Arc::new(MemoryCheckpointStore::new()),
        rx,
    )
    .unwrap();

    let summary = coordinator.run().await.unwrap();

    lookup.assert_async().await;
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.statistics.successful, 1);

    // Rows are tallied but no CSV is written
    assert_eq!(
        summary.year(year(2025)).unwrap().record_counts.get("providers"),
        Some(&1)
    );
    assert!(summary.csv_files.is_empty());
    assert!(!csv_dir.exists());
}
