//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the qpp-extract configuration file.

use crate::cli::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates every section
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  API Base URL: {}", config.api.base_url);
        println!("  Accept: {}", config.api.accept_header);
        if let Some(run) = config.api.run_number {
            println!("  Run Number: {run}");
        }
        println!(
            "  Retries: {} (initial {}ms, max {}ms)",
            config.api.retry.max_retries,
            config.api.retry.initial_delay_ms,
            config.api.retry.max_delay_ms
        );
        println!(
            "  Rate Limit: {} req/s, burst {}",
            config.rate_limit.requests_per_second, config.rate_limit.burst
        );
        println!("  Years: {:?}", config.processing.years);
        println!("  Batch Size: {}", config.processing.batch_size);
        println!("  Max Workers: {}", config.processing.max_workers);
        println!("  Parallel Years: {}", config.processing.parallel_years);
        println!(
            "  NPI Input: {} (column {})",
            config.input.npi_csv_path, config.input.npi_column
        );
        println!("  Output: {}", config.output.base_dir);
        println!("  Checkpoints: {}", config.state.checkpoint_dir);
        println!();
        Ok(EXIT_SUCCESS)
    }
}
