//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML
//! file. Every section has defaults so a minimal file only names what it
//! changes.

use crate::domain::ids::{MAX_PERFORMANCE_YEAR, MIN_PERFORMANCE_YEAR};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Main extractor configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// QPP Eligibility API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Outbound request rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Batch and worker settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// NPI input file settings
    #[serde(default)]
    pub input: InputConfig,

    /// Output directory settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Checkpoint settings
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExtractConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.api.validate()?;
        self.rate_limit.validate()?;
        self.processing.validate()?;
        self.input.validate()?;
        self.output.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (plan the work set without calling the API)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Random jitter added to each delay, as a fraction of the delay
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "api.retry.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }
        if self.initial_delay_ms == 0 {
            return Err("api.retry.initial_delay_ms must be > 0".to_string());
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(format!(
                "api.retry.max_delay_ms ({}) must be >= initial_delay_ms ({})",
                self.max_delay_ms, self.initial_delay_ms
            ));
        }
        if !(1.0..=10.0).contains(&self.backoff_multiplier) {
            return Err(format!(
                "api.retry.backoff_multiplier must be between 1.0 and 10.0, got {}",
                self.backoff_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(format!(
                "api.retry.jitter_ratio must be between 0.0 and 1.0, got {}",
                self.jitter_ratio
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

/// QPP Eligibility API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the QPP service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Versioned media type sent in the Accept header
    #[serde(default = "default_accept_header")]
    pub accept_header: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Upstream run number; omitted from the query when unset
    #[serde(default)]
    pub run_number: Option<u32>,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ApiConfig {
    fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| format!("api.base_url '{}' is not a valid URL: {e}", self.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "api.base_url must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.accept_header.trim().is_empty() {
            return Err("api.accept_header cannot be empty".to_string());
        }
        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(format!(
                "api.timeout_seconds must be between 1 and 300, got {}",
                self.timeout_seconds
            ));
        }
        if self.connect_timeout_seconds == 0 || self.connect_timeout_seconds > self.timeout_seconds
        {
            return Err(format!(
                "api.connect_timeout_seconds must be between 1 and timeout_seconds ({}), got {}",
                self.timeout_seconds, self.connect_timeout_seconds
            ));
        }
        self.retry.validate()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            accept_header: default_accept_header(),
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            run_number: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Token bucket settings shared by every worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Bucket capacity (requests allowed back to back)
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if !(self.requests_per_second > 0.0 && self.requests_per_second <= 100.0) {
            return Err(format!(
                "rate_limit.requests_per_second must be between 0 (exclusive) and 100, got {}",
                self.requests_per_second
            ));
        }
        if self.burst == 0 || self.burst > 100 {
            return Err(format!(
                "rate_limit.burst must be between 1 and 100, got {}",
                self.burst
            ));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
        }
    }
}

/// Batch processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Performance years to extract
    #[serde(default = "default_years")]
    pub years: Vec<u16>,

    /// Work items per checkpointed batch (1-1000)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent requests per year loop
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Run the year loops concurrently
    #[serde(default = "default_true")]
    pub parallel_years: bool,
}

impl ProcessingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.years.is_empty() {
            return Err("processing.years cannot be empty".to_string());
        }
        let mut seen = HashSet::new();
        for year in &self.years {
            if !(MIN_PERFORMANCE_YEAR..=MAX_PERFORMANCE_YEAR).contains(year) {
                return Err(format!(
                    "processing.years entries must be between {MIN_PERFORMANCE_YEAR} and {MAX_PERFORMANCE_YEAR}, got {year}"
                ));
            }
            if !seen.insert(*year) {
                return Err(format!("processing.years contains {year} more than once"));
            }
        }
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(format!(
                "processing.batch_size must be between 1 and 1000, got {}",
                self.batch_size
            ));
        }
        if self.max_workers == 0 || self.max_workers > 64 {
            return Err(format!(
                "processing.max_workers must be between 1 and 64, got {}",
                self.max_workers
            ));
        }
        Ok(())
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            years: default_years(),
            batch_size: default_batch_size(),
            max_workers: default_max_workers(),
            parallel_years: true,
        }
    }
}

/// NPI input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV file listing the NPIs
    #[serde(default = "default_npi_csv_path")]
    pub npi_csv_path: String,

    /// Header of the NPI column
    #[serde(default = "default_npi_column")]
    pub npi_column: String,
}

impl InputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.npi_csv_path.trim().is_empty() {
            return Err("input.npi_csv_path cannot be empty".to_string());
        }
        if self.npi_column.trim().is_empty() {
            return Err("input.npi_column cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            npi_csv_path: default_npi_csv_path(),
            npi_column: default_npi_column(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for csv/, raw/, staging/ and reports/
    #[serde(default = "default_output_dir")]
    pub base_dir: String,

    /// Write the per-table CSV files at the end of the run
    #[serde(default = "default_true")]
    pub generate_csv: bool,

    /// Archive every 200 response body under raw/{year}/{npi}.json
    #[serde(default = "default_true")]
    pub save_raw_responses: bool,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_dir.trim().is_empty() {
            return Err("output.base_dir cannot be empty".to_string());
        }
        Ok(())
    }

    /// Directory for the exported CSV tables
    pub fn csv_dir(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join("csv")
    }

    /// Directory for archived response bodies
    pub fn raw_dir(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join("raw")
    }

    /// Directory for per-batch staged rows
    pub fn staging_dir(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join("staging")
    }

    /// Directory for the processing summary
    pub fn reports_dir(&self) -> PathBuf {
        PathBuf::from(&self.base_dir).join("reports")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_output_dir(),
            generate_csv: true,
            save_raw_responses: true,
        }
    }
}

/// State management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding checkpoint_{year}.json files
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Resume from existing checkpoints (false starts every year over)
    #[serde(default = "default_true")]
    pub resume: bool,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.checkpoint_dir.trim().is_empty() {
            return Err("state.checkpoint_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            resume: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }

    /// Console-only logging, used before a config file is loaded
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            local_path: String::new(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://qpp.cms.gov".to_string()
}

fn default_accept_header() -> String {
    "application/vnd.qpp.cms.gov.v6+json".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter_ratio() -> f64 {
    0.1
}

fn default_requests_per_second() -> f64 {
    2.0
}

fn default_burst() -> u32 {
    5
}

fn default_years() -> Vec<u16> {
    vec![2023, 2024, 2025]
}

fn default_batch_size() -> usize {
    100
}

fn default_max_workers() -> usize {
    4
}

fn default_npi_csv_path() -> String {
    "npis.csv".to_string()
}

fn default_npi_column() -> String {
    "NPI".to_string()
}

fn default_output_dir() -> String {
    "./outputs".to_string()
}

fn default_checkpoint_dir() -> String {
    "./outputs/checkpoints".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
