//! Domain error types
//!
//! This module defines the error hierarchy for the extractor. Per-item API
//! outcomes live in [`ApiError`]; everything that can end a run is an
//! [`ExtractError`]. Third-party error types are converted to strings at
//! the boundary and never leak through the public API.

use thiserror::Error;

/// Main extractor error type
///
/// `Configuration` and `Persistence` are fatal to a run. `Api` and
/// `Validation` are scoped to a single work item or table row and are
/// recorded rather than propagated by the coordinator.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Configuration-related errors (invalid file, invalid input set)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Field or table validation errors from the normalizer
    #[error("Validation error: {0}")]
    Validation(String),

    /// Checkpoint or staging persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Input file errors (NPI list)
    #[error("Input error: {0}")]
    Input(String),

    /// Export (CSV, report) errors
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExtractError {
    /// Whether this error must move the run to `Failed`
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::Configuration(_)
                | ExtractError::Persistence(_)
                | ExtractError::Input(_)
        )
    }
}

/// QPP Eligibility API errors
///
/// These errors don't expose the HTTP client's types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The identifier has no eligibility record for the year (404)
    #[error("No eligibility record for NPI {npi} in {year}")]
    NotFound { npi: String, year: u16 },

    /// The request was rejected (400, 422 and other non-retryable 4xx)
    #[error("Client request error: {status} - {message}")]
    ClientRequest { status: u16, message: String },

    /// Retryable failure: 429, 5xx, timeout or connection error
    #[error("Transient service error: {message}")]
    TransientService {
        status: Option<u16>,
        message: String,
    },

    /// A transient failure that outlived the retry budget
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// 200 response whose body could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Whether the client should retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::TransientService { .. })
    }

    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::ClientRequest { status, .. } => Some(*status),
            ApiError::TransientService { status, .. } => *status,
            ApiError::RetriesExhausted { .. } | ApiError::InvalidResponse(_) => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExtractError {
    fn from(err: toml::de::Error) -> Self {
        ExtractError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv errors
impl From<csv::Error> for ExtractError {
    fn from(err: csv::Error) -> Self {
        ExtractError::Export(format!("CSV error: {err}"))
    }
}
