//! Extract command implementation
//!
//! This module implements the `extract` command for pulling eligibility
//! records from the CMS QPP API into CSV tables.

use crate::adapters::input::{NpiList, NpiReader};
use crate::adapters::storage::FileCheckpointStore;
use crate::cli::{
    exit_code_for, EXIT_CONFIG_ERROR, EXIT_FATAL_ERROR, EXIT_INPUT_ERROR, EXIT_INTERRUPTED,
    EXIT_SUCCESS,
};
use crate::config::{load_config, parse_years, ExtractConfig};
use crate::core::extract::{ExtractionCoordinator, RunState, RunSummary, YearPlan};
use clap::Args;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the extract command
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - show the work plan without calling the API
    #[arg(long)]
    pub dry_run: bool,

    /// Override performance year(s) to extract (comma-separated)
    #[arg(long)]
    pub years: Option<String>,

    /// Override the NPI input CSV
    #[arg(long, value_name = "PATH")]
    pub input: Option<String>,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    pub output: Option<String>,

    /// Ignore existing checkpoints and start every year over
    #[arg(long)]
    pub fresh: bool,

    /// Skip CSV export at the end of the run
    #[arg(long)]
    pub no_csv: bool,
}

impl ExtractArgs {
    /// Applies CLI overrides to a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable `--years` value.
    pub fn apply_overrides(&self, config: &mut ExtractConfig) -> crate::domain::Result<()> {
        if let Some(years) = &self.years {
            let years = parse_years(years)?;
            tracing::info!(years = ?years, "Overriding performance years from CLI");
            config.processing.years = years;
        }

        if let Some(input) = &self.input {
            tracing::info!(input = %input, "Overriding NPI input from CLI");
            config.input.npi_csv_path = input.clone();
        }

        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding output directory from CLI");
            config.output.base_dir = output.clone();
        }

        if self.fresh {
            tracing::info!("Ignoring existing checkpoints from CLI");
            config.state.resume = false;
        }

        if self.no_csv {
            config.output.generate_csv = false;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        Ok(())
    }

    /// Execute the extract command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting extract command");

        // Load configuration
        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            eprintln!("{e}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        // Validate configuration
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }

        // Load NPIs
        let list = match NpiReader::new(&config.input.npi_csv_path, &config.input.npi_column).read() {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read NPI input");
                eprintln!("Failed to read NPI input: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        print_input_summary(&config, &list);

        if list.npis.is_empty() {
            eprintln!("No valid NPIs found in {}", config.input.npi_csv_path);
            return Ok(EXIT_INPUT_ERROR);
        }

        let dry_run = config.application.dry_run;
        let store = Arc::new(FileCheckpointStore::new(&config.state.checkpoint_dir));

        tracing::info!("Creating extraction coordinator");
        let coordinator =
            match ExtractionCoordinator::new(config.clone(), list.npis, store, shutdown_signal) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create extraction coordinator");
                    eprintln!("Failed to initialize extraction: {e}");
                    return Ok(exit_code_for(&e));
                }
            };

        let plans = match coordinator.plan().await {
            Ok(plans) => plans,
            Err(e) => {
                tracing::error!(error = %e, "Failed to plan extraction");
                eprintln!("Failed to plan extraction: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        print_plan(&config, &plans);

        // Dry run mode
        if dry_run {
            tracing::info!("Dry run mode enabled - no API calls will be made");
            println!("🔍 DRY RUN MODE - No API calls made and nothing written");
            return Ok(EXIT_SUCCESS);
        }

        // Confirmation prompt (unless --yes)
        if !self.yes {
            print!("Proceed with extraction? [y/N]: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Extraction cancelled.");
                return Ok(EXIT_SUCCESS);
            }
        }

        println!("🚀 Starting extraction...");
        println!();

        let mut progress = coordinator.subscribe();
        let reporter = tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let current = progress.borrow_and_update().clone();
                if current.state == RunState::Running && current.total > 0 {
                    print!(
                        "\r  Progress: {}/{} ({:.1}%)",
                        current.processed,
                        current.total,
                        current.percent()
                    );
                    let _ = io::stdout().flush();
                }
            }
        });

        let result = coordinator.run().await;
        reporter.abort();
        println!();

        let summary = match result {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Extraction failed");
                eprintln!("Extraction failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_summary(&summary);
        Ok(exit_code(&summary))
    }
}

/// Exit code for a finished run
pub fn exit_code(summary: &RunSummary) -> i32 {
    match summary.state {
        RunState::Interrupted => EXIT_INTERRUPTED,
        RunState::Failed => EXIT_FATAL_ERROR,
        _ if summary.interrupted => EXIT_INTERRUPTED,
        _ => EXIT_SUCCESS,
    }
}

fn print_input_summary(config: &ExtractConfig, list: &NpiList) {
    println!("📥 NPI Input: {}", config.input.npi_csv_path);
    println!("  Rows: {}", list.stats.total_rows);
    println!("  Valid: {}", list.stats.valid);
    println!("  Invalid: {}", list.stats.invalid);
    println!("  Duplicates: {}", list.stats.duplicates);
    println!("  Blank: {}", list.stats.blank);
    for rejected in list.invalid.iter().take(5) {
        println!("    - line {}: {:?}", rejected.line, rejected.value);
    }
    if list.invalid.len() > 5 {
        println!("    ... and {} more invalid values", list.invalid.len() - 5);
    }
    println!();
}

fn print_plan(config: &ExtractConfig, plans: &[YearPlan]) {
    println!("Extraction Plan:");
    println!("  API: {}", config.api.base_url);
    println!(
        "  Rate limit: {} req/s (burst {})",
        config.rate_limit.requests_per_second, config.rate_limit.burst
    );
    println!(
        "  Batch size: {}, workers: {}, parallel years: {}",
        config.processing.batch_size,
        config.processing.max_workers,
        config.processing.parallel_years
    );
    println!("  Output: {}", config.output.base_dir);
    println!("  Resume: {}", config.state.resume);
    println!();
    println!("{:<8} {:>10} {:>10} {:>10}", "Year", "NPIs", "Done", "Remaining");
    for plan in plans {
        println!(
            "{:<8} {:>10} {:>10} {:>10}",
            plan.year, plan.total, plan.resumed, plan.remaining
        );
    }
    let remaining: u64 = plans.iter().map(|plan| plan.remaining).sum();
    let seconds = remaining as f64 / config.rate_limit.requests_per_second;
    println!();
    println!(
        "  {remaining} API calls remaining, at least {:.1} minutes at the configured rate",
        seconds / 60.0
    );
    println!();
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.statistics;

    println!();
    println!("📊 Extraction Summary:");
    println!("  Run ID: {}", summary.run_id);
    println!("  State: {}", summary.state);
    println!("  API Calls: {}", stats.total_api_calls);
    println!("  Successful: {}", stats.successful);
    println!("  Not Found (404): {}", stats.not_found);
    println!("  Client Errors: {}", stats.client_errors);
    println!("  Retries Exhausted: {}", stats.exhausted_retries());
    println!("  Retries: {}", stats.retries);
    println!("  Rate Limit Hits: {}", stats.rate_limit_hits);
    println!("  Validation Issues: {}", summary.validation_issues.len());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    for year in &summary.years {
        println!(
            "  {} [{}]: {} processed, {} resumed, {} remaining",
            year.year, year.status, year.processed, year.resumed, year.remaining
        );
        for (table, count) in &year.record_counts {
            println!("    {table}: {count}");
        }
    }

    if !summary.csv_files.is_empty() {
        println!();
        println!("  CSV files written: {}", summary.csv_files.len());
    }

    if !summary.errors.is_empty() {
        println!();
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
    }
    println!();

    match summary.state {
        RunState::Interrupted => {
            println!("⚠️  Extraction interrupted gracefully. Progress saved.");
            println!("   Run the same command to resume from checkpoint.");
        }
        RunState::Failed => println!("❌ Extraction failed"),
        _ => println!("✅ Extraction completed!"),
    }
    println!();
}
