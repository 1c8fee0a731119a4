//! Raw API records and their outcome classification

use super::work::WorkItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Terminal classification of one lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// 200 with a decodable eligibility record
    Success,
    /// 404: no record for the identifier in that year
    NotFound,
    /// Non-retryable 4xx or an undecodable 200 body
    ClientError,
    /// Retries exhausted, last response was 5xx
    ServerError,
    /// Retries exhausted on 429 or a network/timeout error
    TransientFailure,
}

impl FetchOutcome {
    /// Stable lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::NotFound => "not_found",
            FetchOutcome::ClientError => "client_error",
            FetchOutcome::ServerError => "server_error",
            FetchOutcome::TransientFailure => "transient_failure",
        }
    }

    /// Whether retries ran out before a terminal answer was received
    pub fn is_exhausted(&self) -> bool {
        matches!(
            self,
            FetchOutcome::ServerError | FetchOutcome::TransientFailure
        )
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of fetching one [`WorkItem`]
///
/// `body` holds the unwrapped `data` object and is only present for
/// [`FetchOutcome::Success`].
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub item: WorkItem,
    pub outcome: FetchOutcome,
    /// Last HTTP status received, `None` when no response arrived
    pub status: Option<u16>,
    pub body: Option<Value>,
    /// Network attempts made, including the first
    pub attempts: u32,
    /// Wall time from first attempt to terminal answer
    pub latency: Duration,
    pub error: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl RawRecord {
    /// A successful single-attempt record
    pub fn success(item: WorkItem, body: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            item,
            outcome: FetchOutcome::Success,
            status: Some(200),
            body: Some(body),
            attempts: 1,
            latency: Duration::ZERO,
            error: None,
            fetched_at,
        }
    }

    /// A terminal failure record
    pub fn failure(
        item: WorkItem,
        outcome: FetchOutcome,
        status: Option<u16>,
        error: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item,
            outcome,
            status,
            body: None,
            attempts: 1,
            latency: Duration::ZERO,
            error: Some(error.into()),
            fetched_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == FetchOutcome::Success
    }
}
