//! Run statistics shared by the client and the coordinator
//!
//! Counters are atomics so every worker can update them without a lock.
//! Each registered year has its own [`Counters`]; every update is applied
//! to the year and to the overall totals.

use super::ids::PerformanceYear;
use super::record::FetchOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Atomic counter set for one scope (a year, or the whole run)
#[derive(Debug, Default)]
pub struct Counters {
    total_identifiers: AtomicU64,
    total_api_calls: AtomicU64,
    http_attempts: AtomicU64,
    successful: AtomicU64,
    not_found: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    transient_failures: AtomicU64,
    retries: AtomicU64,
    rate_limit_hits: AtomicU64,
    validation_errors: AtomicU64,
    latency_total_micros: AtomicU64,
    latency_max_micros: AtomicU64,
}

impl Counters {
    fn record_outcome(&self, outcome: FetchOutcome, latency: Duration) {
        self.total_api_calls.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            FetchOutcome::Success => &self.successful,
            FetchOutcome::NotFound => &self.not_found,
            FetchOutcome::ClientError => &self.client_errors,
            FetchOutcome::ServerError => &self.server_errors,
            FetchOutcome::TransientFailure => &self.transient_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_total_micros.fetch_add(micros, Ordering::Relaxed);
        self.latency_max_micros.fetch_max(micros, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_identifiers: self.total_identifiers.load(Ordering::Relaxed),
            total_api_calls: self.total_api_calls.load(Ordering::Relaxed),
            http_attempts: self.http_attempts.load(Ordering::Relaxed),
            successful: self.successful.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            latency_total_micros: self.latency_total_micros.load(Ordering::Relaxed),
            latency_max_micros: self.latency_max_micros.load(Ordering::Relaxed),
        }
    }

    /// Adds previously persisted counts (used when resuming)
    ///
    /// `total_identifiers` is not absorbed; it is set from the current
    /// input on every run.
    fn absorb(&self, saved: &CounterSnapshot) {
        self.total_api_calls
            .fetch_add(saved.total_api_calls, Ordering::Relaxed);
        self.http_attempts
            .fetch_add(saved.http_attempts, Ordering::Relaxed);
        self.successful.fetch_add(saved.successful, Ordering::Relaxed);
        self.not_found.fetch_add(saved.not_found, Ordering::Relaxed);
        self.client_errors
            .fetch_add(saved.client_errors, Ordering::Relaxed);
        self.server_errors
            .fetch_add(saved.server_errors, Ordering::Relaxed);
        self.transient_failures
            .fetch_add(saved.transient_failures, Ordering::Relaxed);
        self.retries.fetch_add(saved.retries, Ordering::Relaxed);
        self.rate_limit_hits
            .fetch_add(saved.rate_limit_hits, Ordering::Relaxed);
        self.validation_errors
            .fetch_add(saved.validation_errors, Ordering::Relaxed);
        self.latency_total_micros
            .fetch_add(saved.latency_total_micros, Ordering::Relaxed);
        self.latency_max_micros
            .fetch_max(saved.latency_max_micros, Ordering::Relaxed);
    }
}

/// Serializable copy of [`Counters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSnapshot {
    pub total_identifiers: u64,
    /// Logical lookups (one per work item, regardless of retries)
    pub total_api_calls: u64,
    /// Network attempts including retries
    pub http_attempts: u64,
    pub successful: u64,
    pub not_found: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub transient_failures: u64,
    pub retries: u64,
    pub rate_limit_hits: u64,
    pub validation_errors: u64,
    pub latency_total_micros: u64,
    pub latency_max_micros: u64,
}

impl CounterSnapshot {
    /// Lookups whose retry budget ran out
    pub fn exhausted_retries(&self) -> u64 {
        self.server_errors + self.transient_failures
    }

    /// Lookups that ended without a record (404 excluded)
    pub fn failed(&self) -> u64 {
        self.client_errors + self.exhausted_retries()
    }

    /// Mean latency per logical lookup in milliseconds
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_api_calls == 0 {
            0.0
        } else {
            self.latency_total_micros as f64 / self.total_api_calls as f64 / 1000.0
        }
    }

    pub fn max_latency_ms(&self) -> f64 {
        self.latency_max_micros as f64 / 1000.0
    }

    /// Successful lookups as a percentage of all lookups
    pub fn success_rate(&self) -> f64 {
        if self.total_api_calls == 0 {
            0.0
        } else {
            self.successful as f64 / self.total_api_calls as f64 * 100.0
        }
    }
}

/// Run-wide statistics, per year and overall
///
/// Years are registered up front; updates for an unregistered year count
/// toward the overall totals only.
#[derive(Debug, Default)]
pub struct RunStatistics {
    overall: Counters,
    per_year: BTreeMap<PerformanceYear, Arc<Counters>>,
}

impl RunStatistics {
    /// Creates statistics with one counter set per year
    pub fn new(years: &[PerformanceYear]) -> Self {
        Self {
            overall: Counters::default(),
            per_year: years
                .iter()
                .map(|year| (*year, Arc::new(Counters::default())))
                .collect(),
        }
    }

    fn for_each_scope(&self, year: PerformanceYear, f: impl Fn(&Counters)) {
        f(&self.overall);
        if let Some(counters) = self.per_year.get(&year) {
            f(counters);
        }
    }

    /// Sets the identifier count for a year and adds it to the overall total
    pub fn set_total_identifiers(&self, year: PerformanceYear, count: u64) {
        self.overall
            .total_identifiers
            .fetch_add(count, Ordering::Relaxed);
        if let Some(counters) = self.per_year.get(&year) {
            counters.total_identifiers.store(count, Ordering::Relaxed);
        }
    }

    pub fn record_attempt(&self, year: PerformanceYear) {
        self.for_each_scope(year, |c| {
            c.http_attempts.fetch_add(1, Ordering::Relaxed);
        });
    }

    pub fn record_retry(&self, year: PerformanceYear) {
        self.for_each_scope(year, |c| {
            c.retries.fetch_add(1, Ordering::Relaxed);
        });
    }

    /// Counts a 429 response
    pub fn record_rate_limited(&self, year: PerformanceYear) {
        self.for_each_scope(year, |c| {
            c.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        });
    }

    /// Counts the terminal outcome of one logical lookup
    pub fn record_outcome(&self, year: PerformanceYear, outcome: FetchOutcome, latency: Duration) {
        self.for_each_scope(year, |c| c.record_outcome(outcome, latency));
    }

    pub fn record_validation_errors(&self, year: PerformanceYear, count: u64) {
        if count == 0 {
            return;
        }
        self.for_each_scope(year, |c| {
            c.validation_errors.fetch_add(count, Ordering::Relaxed);
        });
    }

    /// Restores counts saved in a checkpoint for `year`
    pub fn restore(&self, year: PerformanceYear, saved: &CounterSnapshot) {
        self.for_each_scope(year, |c| c.absorb(saved));
    }

    pub fn overall(&self) -> CounterSnapshot {
        self.overall.snapshot()
    }

    /// Snapshot for one year, `None` if the year was not registered
    pub fn year(&self, year: PerformanceYear) -> Option<CounterSnapshot> {
        self.per_year.get(&year).map(|c| c.snapshot())
    }

    /// Snapshots for every registered year, in year order
    pub fn years(&self) -> BTreeMap<PerformanceYear, CounterSnapshot> {
        self.per_year
            .iter()
            .map(|(year, counters)| (*year, counters.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(y: u16) -> PerformanceYear {
        PerformanceYear::new(y).unwrap()
    }

    #[test]
    fn test_outcomes_update_year_and_overall() {
        let stats = RunStatistics::new(&[year(2023), year(2024)]);

        stats.record_attempt(year(2023));
        stats.record_outcome(year(2023), FetchOutcome::Success, Duration::from_millis(20));
        stats.record_attempt(year(2024));
        stats.record_outcome(year(2024), FetchOutcome::NotFound, Duration::from_millis(40));

        let overall = stats.overall();
        assert_eq!(overall.total_api_calls, 2);
        assert_eq!(overall.http_attempts, 2);
        assert_eq!(overall.successful, 1);
        assert_eq!(overall.not_found, 1);
        assert_eq!(overall.latency_max_micros, 40_000);
        assert!((overall.average_latency_ms() - 30.0).abs() < f64::EPSILON);

        let y2023 = stats.year(year(2023)).unwrap();
        assert_eq!(y2023.total_api_calls, 1);
        assert_eq!(y2023.successful, 1);
        assert_eq!(y2023.not_found, 0);
    }

    #[test]
    fn test_unregistered_year_counts_overall_only() {
        let stats = RunStatistics::new(&[year(2023)]);
        stats.record_retry(year(2025));
        assert_eq!(stats.overall().retries, 1);
        assert!(stats.year(year(2025)).is_none());
        assert_eq!(stats.year(year(2023)).unwrap().retries, 0);
    }

    #[test]
    fn test_restore_adds_saved_counts() {
        let stats = RunStatistics::new(&[year(2023)]);
        stats.set_total_identifiers(year(2023), 10);
        let saved = CounterSnapshot {
            total_identifiers: 99,
            total_api_calls: 4,
            successful: 3,
            not_found: 1,
            latency_max_micros: 500,
            ..CounterSnapshot::default()
        };
        stats.restore(year(2023), &saved);
        stats.record_outcome(year(2023), FetchOutcome::Success, Duration::from_micros(100));

        let snapshot = stats.year(year(2023)).unwrap();
        assert_eq!(snapshot.total_identifiers, 10);
        assert_eq!(snapshot.total_api_calls, 5);
        assert_eq!(snapshot.successful, 4);
        assert_eq!(snapshot.latency_max_micros, 500);
    }

    #[test]
    fn test_snapshot_derived_values() {
        let snapshot = CounterSnapshot {
            total_api_calls: 4,
            successful: 1,
            client_errors: 1,
            server_errors: 1,
            transient_failures: 1,
            ..CounterSnapshot::default()
        };
        assert_eq!(snapshot.exhausted_retries(), 2);
        assert_eq!(snapshot.failed(), 3);
        assert!((snapshot.success_rate() - 25.0).abs() < f64::EPSILON);
        assert_eq!(CounterSnapshot::default().average_latency_ms(), 0.0);
    }

    #[test]
    fn test_validation_errors_zero_is_noop() {
        let stats = RunStatistics::new(&[year(2023)]);
        stats.record_validation_errors(year(2023), 0);
        stats.record_validation_errors(year(2023), 2);
        assert_eq!(stats.overall().validation_errors, 2);
    }
}
