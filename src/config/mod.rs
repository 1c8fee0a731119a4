//! Configuration management for QPP Extract.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `QPP_*` environment
//! overrides, defaults for every setting, and validation on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use qpp_extract::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("qpp-extract.toml")?;
//!
//! println!("API: {}", config.api.base_url);
//! println!("Years: {:?}", config.processing.years);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://qpp.cms.gov"
//!
//! [api.retry]
//! max_retries = 3
//!
//! [rate_limit]
//! requests_per_second = 2.0
//! burst = 5
//!
//! [processing]
//! years = [2023, 2024, 2025]
//! batch_size = 100
//! max_workers = 4
//!
//! [input]
//! npi_csv_path = "${QPP_NPI_FILE}"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config, parse_years};
pub use schema::{
    ApiConfig, ApplicationConfig, ExtractConfig, InputConfig, LoggingConfig, OutputConfig,
    ProcessingConfig, RateLimitConfig, RetryConfig, StateConfig,
};
