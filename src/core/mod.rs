//! Core business logic for qpp-extract.
//!
//! # Modules
//!
//! - [`normalize`] - Mapping of eligibility records into six relational tables
//! - [`state`] - Per-year checkpoints for resumable runs
//! - [`extract`] - Extraction orchestration, batch processing and reporting
//! - [`export`] - CSV tables, data dictionary and export summary
//!
//! # Extraction Workflow
//!
//! 1. **Plan**: Load the year checkpoints and subtract completed NPIs
//! 2. **Fetch**: Look up each (NPI, year) through the rate-limited client
//! 3. **Normalize**: Flatten successful records into table rows
//! 4. **Stage**: Write each batch's rows to a JSON Lines file
//! 5. **Checkpoint**: Commit the batch's NPIs and the year counters
//! 6. **Export**: Write the CSV tables once every year completed
//! 7. **Report**: Write the processing summary
//!
//! # Example
//!
//! ```rust,no_run
//! use qpp_extract::adapters::input::NpiReader;
//! use qpp_extract::adapters::storage::FileCheckpointStore;
//! use qpp_extract::config::load_config;
//! use qpp_extract::core::extract::ExtractionCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("qpp-extract.toml")?;
//! let npis = NpiReader::new(&config.input.npi_csv_path, &config.input.npi_column).read()?;
//! let store = Arc::new(FileCheckpointStore::new(&config.state.checkpoint_dir));
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = ExtractionCoordinator::new(config, npis.npis, store, shutdown_rx)?;
//! let summary = coordinator.run().await?;
//!
//! println!("Successful: {}", summary.statistics.successful);
//! println!("Not found: {}", summary.statistics.not_found);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod extract;
pub mod normalize;
pub mod state;
