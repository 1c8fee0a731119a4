//! Logging and observability
//!
//! Structured logging through `tracing`, with a stderr console layer and an
//! optional JSON file that rotates daily or hourly.
//!
//! # Example
//!
//! ```no_run
//! use qpp_extract::logging::init_logging;
//! use qpp_extract::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Extraction started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a year's extraction loop
///
/// # Example
///
/// ```no_run
/// use qpp_extract::log_year_start;
///
/// log_year_start!(2024, 1200, 300);
/// ```
#[macro_export]
macro_rules! log_year_start {
    ($year:expr, $remaining:expr, $skipped:expr) => {
        tracing::info!(
            year = %$year,
            remaining = $remaining,
            skipped = $skipped,
            "Starting year extraction"
        );
    };
}

/// Log a batch processing operation
///
/// # Example
///
/// ```no_run
/// use qpp_extract::log_batch_processing;
///
/// log_batch_processing!(100, 1000);
/// ```
#[macro_export]
macro_rules! log_batch_processing {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = if $total == 0 {
                100.0
            } else {
                $current as f64 / $total as f64 * 100.0
            },
            "Processing batch"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use qpp_extract::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "503 Service Unavailable");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request after error"
        );
    };
}
