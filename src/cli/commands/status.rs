//! Status command implementation
//!
//! This module implements the `status` command for displaying the
//! per-year checkpoints.

use crate::adapters::storage::FileCheckpointStore;
use crate::cli::{EXIT_CONFIG_ERROR, EXIT_FATAL_ERROR, EXIT_SUCCESS};
use crate::config::load_config;
use crate::core::state::{CheckpointStatus, StateManager};
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Filter by performance year
    #[arg(long)]
    pub year: Option<u16>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking extraction status");

        println!("📊 Extraction Status");
        println!();

        // Load configuration
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let store = Arc::new(FileCheckpointStore::new(&config.state.checkpoint_dir));
        let state_manager = StateManager::new(store);

        let checkpoints = match state_manager.all().await {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load checkpoints");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL_ERROR);
            }
        };

        if checkpoints.is_empty() {
            println!("No extraction history found.");
            println!("Run 'qpp-extract extract' to start extracting data.");
            return Ok(EXIT_SUCCESS);
        }

        let filtered: Vec<_> = checkpoints
            .iter()
            .filter(|c| self.year.map_or(true, |year| c.year.get() == year))
            .collect();

        if filtered.is_empty() {
            println!("No checkpoints match the specified filters.");
            return Ok(EXIT_SUCCESS);
        }

        println!("Found {} checkpoint(s) in {}:", filtered.len(), config.state.checkpoint_dir);
        println!();
        println!(
            "{:<6} {:<16} {:>10} {:>8} {:>10} {:>10} {:>8} {:<20}",
            "Year", "Status", "Completed", "Batches", "Successful", "Not Found", "Failed", "Last Update"
        );
        println!("{}", "-".repeat(96));

        for checkpoint in filtered {
            let status = match checkpoint.status {
                CheckpointStatus::Completed => "✅ Completed",
                CheckpointStatus::InProgress => "🔄 In Progress",
                CheckpointStatus::Interrupted => "⏸️  Interrupted",
                CheckpointStatus::Failed => "❌ Failed",
                CheckpointStatus::NotStarted => "⏸️  Not Started",
            };

            println!(
                "{:<6} {:<16} {:>10} {:>8} {:>10} {:>10} {:>8} {:<20}",
                checkpoint.year,
                status,
                checkpoint.completed_count(),
                checkpoint.batches_committed,
                checkpoint.counters.successful,
                checkpoint.counters.not_found,
                checkpoint.counters.failed(),
                checkpoint.updated_at.format("%Y-%m-%d %H:%M:%S")
            );
        }

        println!();
        Ok(EXIT_SUCCESS)
    }
}
