//! QPP Eligibility API client
//!
//! One logical lookup per [`WorkItem`]: rate-limited, retried with
//! exponential backoff, classified into a [`FetchOutcome`] and counted in
//! the shared [`RunStatistics`]. Lookups never return an error; every
//! failure is carried on the returned [`RawRecord`].

use super::models::{truncate_for_log, EligibilityEnvelope, ErrorEnvelope};
use super::rate_limiter::RateLimiter;
use crate::config::{ApiConfig, RetryConfig};
use crate::domain::{
    ApiError, ExtractError, FetchOutcome, RawRecord, Result, RunStatistics, WorkItem,
};
use chrono::Utc;
use rand::Rng;
use reqwest::header::{HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("qpp-extract/", env!("CARGO_PKG_VERSION"));

/// A failed attempt and the server's requested wait, if any
struct AttemptFailure {
    error: ApiError,
    retry_after: Option<Duration>,
}

impl AttemptFailure {
    fn new(error: ApiError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// Client for `GET /api/eligibility/npi/{npi}`
///
/// # Example
///
/// ```no_run
/// use qpp_extract::adapters::qpp::{QppClient, RateLimiter};
/// use qpp_extract::config::ApiConfig;
/// use qpp_extract::domain::{Npi, PerformanceYear, RunStatistics, WorkItem};
/// use std::sync::Arc;
///
/// # async fn example() -> qpp_extract::domain::Result<()> {
/// let year = PerformanceYear::new(2024).unwrap();
/// let limiter = Arc::new(RateLimiter::new(2.0, 5)?);
/// let stats = Arc::new(RunStatistics::new(&[year]));
/// let client = QppClient::new(&ApiConfig::default(), limiter, stats)?;
///
/// let item = WorkItem::new(Npi::new("1234567890").unwrap(), year);
/// let record = client.fetch(&item).await;
/// println!("{}: {}", item, record.outcome);
/// # Ok(())
/// # }
/// ```
pub struct QppClient {
    http: Client,
    base_url: Url,
    accept: HeaderValue,
    retry: RetryConfig,
    limiter: Arc<RateLimiter>,
    stats: Arc<RunStatistics>,
}

impl QppClient {
    /// Builds the client from API settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable base URL or Accept
    /// header, or if the HTTP client cannot be built.
    pub fn new(
        config: &ApiConfig,
        limiter: Arc<RateLimiter>,
        stats: Arc<RunStatistics>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ExtractError::Configuration(format!("Invalid API base URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ExtractError::Configuration(format!(
                "API base URL cannot carry a path: {}",
                config.base_url
            )));
        }

        let accept = HeaderValue::from_str(&config.accept_header).map_err(|e| {
            ExtractError::Configuration(format!(
                "Invalid Accept header {}: {e}",
                config.accept_header
            ))
        })?;

        let http = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| {
                ExtractError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url,
            accept,
            retry: config.retry.clone(),
            limiter,
            stats,
        })
    }

    /// Shared statistics this client updates
    pub fn stats(&self) -> &Arc<RunStatistics> {
        &self.stats
    }

    /// Builds `{base}/api/eligibility/npi/{npi}?year=..[&runNumber=..]`
    pub fn endpoint(&self, item: &WorkItem) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "eligibility", "npi", item.npi.as_str()]);
        }
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair("year", &item.year.to_string());
            if let Some(run) = item.run_number {
                query.append_pair("runNumber", &run.to_string());
            }
        }
        url
    }

    /// Looks up one work item
    ///
    /// The rate limiter is applied before every network attempt. Retryable
    /// failures (429, 5xx, network errors) are retried up to
    /// `max_retries` times. The recorded latency is the sum of the
    /// attempts' request times.
    pub async fn fetch(&self, item: &WorkItem) -> RawRecord {
        let url = self.endpoint(item);
        let max_retries = self.retry.max_retries;
        let mut attempts: u32 = 0;
        // Time on the wire only; limiter waits and backoff sleeps are excluded
        let mut latency = Duration::ZERO;

        let result = loop {
            self.limiter.acquire().await;
            attempts += 1;
            self.stats.record_attempt(item.year);

            let sent = Instant::now();
            let attempt = self.send_once(&url, item).await;
            latency += sent.elapsed();

            match attempt {
                Ok(body) => break Ok(body),
                Err(failure) => {
                    if failure.error.status() == Some(429) {
                        self.stats.record_rate_limited(item.year);
                    }
                    if !failure.error.is_retryable() || attempts > max_retries {
                        break Err(failure.error);
                    }

                    let delay = self.backoff_delay(attempts, failure.retry_after);
                    self.stats.record_retry(item.year);
                    crate::log_retry_attempt!(
                        attempts,
                        max_retries,
                        delay.as_millis() as u64,
                        failure.error
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };

        let record = self.build_record(item, result, attempts, latency);
        self.stats
            .record_outcome(item.year, record.outcome, record.latency);

        match record.outcome {
            FetchOutcome::Success => tracing::debug!(
                npi = %item.npi,
                year = %item.year,
                attempts,
                latency_ms = latency.as_millis() as u64,
                "Fetched eligibility record"
            ),
            FetchOutcome::NotFound => tracing::info!(
                npi = %item.npi,
                year = %item.year,
                "No eligibility record (404)"
            ),
            _ => tracing::warn!(
                npi = %item.npi,
                year = %item.year,
                outcome = %record.outcome,
                status = ?record.status,
                attempts,
                error = record.error.as_deref().unwrap_or_default(),
                "Eligibility lookup failed"
            ),
        }

        record
    }

    fn build_record(
        &self,
        item: &WorkItem,
        result: std::result::Result<Value, ApiError>,
        attempts: u32,
        latency: Duration,
    ) -> RawRecord {
        let fetched_at = Utc::now();
        let mut record = match result {
            Ok(body) => RawRecord::success(item.clone(), body, fetched_at),
            Err(error) => {
                let status = error.status();
                let (outcome, message) = match &error {
                    ApiError::NotFound { .. } => (FetchOutcome::NotFound, error.to_string()),
                    ApiError::ClientRequest { .. } | ApiError::InvalidResponse(_) => {
                        (FetchOutcome::ClientError, error.to_string())
                    }
                    ApiError::TransientService { status, .. } => {
                        let outcome = match status {
                            Some(code) if *code >= 500 => FetchOutcome::ServerError,
                            _ => FetchOutcome::TransientFailure,
                        };
                        let exhausted = ApiError::RetriesExhausted {
                            attempts,
                            last_error: error.to_string(),
                        };
                        (outcome, exhausted.to_string())
                    }
                    ApiError::RetriesExhausted { .. } => {
                        (FetchOutcome::TransientFailure, error.to_string())
                    }
                };
                RawRecord::failure(item.clone(), outcome, status, message, fetched_at)
            }
        };
        record.attempts = attempts;
        record.latency = latency;
        record
    }

    async fn send_once(
        &self,
        url: &Url,
        item: &WorkItem,
    ) -> std::result::Result<Value, AttemptFailure> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, self.accept.clone())
            .send()
            .await
            .map_err(|e| {
                AttemptFailure::new(ApiError::TransientService {
                    status: None,
                    message: request_error_message(&e),
                })
            })?;

        let status = response.status();
        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::SERVICE_UNAVAILABLE
        {
            parse_retry_after(response.headers().get(RETRY_AFTER))
        } else {
            None
        };

        let body = response.text().await.map_err(|e| {
            AttemptFailure::new(ApiError::TransientService {
                status: Some(status.as_u16()),
                message: format!("failed to read response body: {e}"),
            })
        })?;

        if status == StatusCode::OK {
            return EligibilityEnvelope::unwrap_record(&body)
                .map_err(|e| AttemptFailure::new(ApiError::InvalidResponse(e)));
        }

        let error = if status == StatusCode::NOT_FOUND {
            ApiError::NotFound {
                npi: item.npi.to_string(),
                year: item.year.get(),
            }
        } else if is_retryable_status(status) {
            ApiError::TransientService {
                status: Some(status.as_u16()),
                message: format!("{status}: {}", ErrorEnvelope::message_from(&body)),
            }
        } else if status.is_client_error() {
            ApiError::ClientRequest {
                status: status.as_u16(),
                message: ErrorEnvelope::message_from(&body),
            }
        } else {
            ApiError::InvalidResponse(format!(
                "unexpected status {status}: {}",
                truncate_for_log(&body)
            ))
        };

        Err(AttemptFailure { error, retry_after })
    }

    /// Delay before retry number `attempt` (1-based)
    ///
    /// `initial * multiplier^(attempt-1)` plus up to `jitter_ratio` random
    /// jitter, or the server's Retry-After value; both capped at
    /// `max_delay_ms`.
    fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let max = Duration::from_millis(self.retry.max_delay_ms);
        if let Some(wait) = retry_after {
            return wait.min(max);
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base_ms = (self.retry.initial_delay_ms as f64
            * self.retry.backoff_multiplier.powi(exponent))
        .min(self.retry.max_delay_ms as f64);
        let jitter_ms = if self.retry.jitter_ratio > 0.0 {
            rand::thread_rng().gen_range(0.0..=self.retry.jitter_ratio) * base_ms
        } else {
            0.0
        };

        Duration::from_millis((base_ms + jitter_ms) as u64).min(max)
    }
}

/// 429 and every 5xx are retried
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Parses a Retry-After header given in seconds
pub fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    let value = value?.to_str().ok()?.trim();
    let secs = value.parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

fn request_error_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
