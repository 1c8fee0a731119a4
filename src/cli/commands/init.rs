//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG_ERROR, EXIT_FATAL_ERROR, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "qpp-extract.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing qpp-extract configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Put your NPI list in a CSV with an 'NPI' column");
                println!("  3. Validate configuration: qpp-extract validate-config");
                println!("  4. Preview the work: qpp-extract extract --dry-run");
                println!("  5. Run extraction: qpp-extract extract");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL_ERROR)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# QPP Extract Configuration File
# CMS QPP Eligibility Extraction Tool

[application]
log_level = "info"
dry_run = false

[api]
base_url = "https://qpp.cms.gov"
accept_header = "application/vnd.qpp.cms.gov.v6+json"
timeout_seconds = 30

[api.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 8000

[rate_limit]
requests_per_second = 2.0
burst = 5

[processing]
years = [2023, 2024, 2025]
batch_size = 100
max_workers = 4
parallel_years = true

[input]
npi_csv_path = "npis.csv"
npi_column = "NPI"

[output]
base_dir = "./outputs"
generate_csv = true
save_raw_responses = true

[state]
checkpoint_dir = "./outputs/checkpoints"
resume = true

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# QPP Extract Configuration File
# CMS QPP Eligibility Extraction Tool
#
# Every value below is the default. String values may reference
# environment variables with ${...} syntax, and QPP_<SECTION>_<KEY>
# variables (for example QPP_PROCESSING_BATCH_SIZE) override the file.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (print the work plan, make no API calls)
dry_run = false

# ============================================================================
# CMS QPP Eligibility API
# ============================================================================
[api]
# Requests go to {base_url}/api/eligibility/npi/{npi}?year={year}
base_url = "https://qpp.cms.gov"

# Versioned media type sent as Accept
accept_header = "application/vnd.qpp.cms.gov.v6+json"

# Per-request and connect timeouts
timeout_seconds = 30
connect_timeout_seconds = 10

# Optional upstream run number (runNumber query parameter)
# run_number = 1

[api.retry]
# Retries after the first attempt for 429, 5xx and network errors (0-10)
max_retries = 3

# Exponential backoff: initial * multiplier^(retry-1), capped at max
initial_delay_ms = 1000
max_delay_ms = 8000
backoff_multiplier = 2.0

# Random extra delay as a fraction of the backoff (0.0-1.0)
jitter_ratio = 0.1

# ============================================================================
# Rate Limiting
# ============================================================================
[rate_limit]
# Sustained request rate shared by every worker and year
requests_per_second = 2.0

# Requests allowed back to back before the rate applies
burst = 5

# ============================================================================
# Processing
# ============================================================================
[processing]
# Performance years to extract (2017-2030)
years = [2023, 2024, 2025]

# Work items per checkpointed batch (1-1000)
batch_size = 100

# Concurrent requests per year (1-64)
max_workers = 4

# Run the years concurrently
parallel_years = true

# ============================================================================
# Input
# ============================================================================
[input]
# CSV file holding the NPI list (comma, semicolon, tab or pipe delimited)
npi_csv_path = "npis.csv"

# Header of the NPI column
npi_column = "NPI"

# ============================================================================
# Output
# ============================================================================
[output]
# Root of csv/, raw/, staging/ and reports/
base_dir = "./outputs"

# Write the six CSV tables, data dictionary and export summary
generate_csv = true

# Keep each successful response as raw/{year}/{npi}.json
save_raw_responses = true

# ============================================================================
# Checkpoints
# ============================================================================
[state]
# Directory holding checkpoint_{year}.json
checkpoint_dir = "./outputs/checkpoints"

# Resume from existing checkpoints (false starts every year over)
resume = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# Write JSON logs to a rotating file as well as the console
local_enabled = true
local_path = "./logs"

# Rotation strategy (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}
