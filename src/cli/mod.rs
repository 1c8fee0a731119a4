//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for qpp-extract using clap.

pub mod commands;

use crate::domain::ExtractError;
use clap::{Parser, Subcommand};

/// Run finished (per-item lookup failures included)
pub const EXIT_SUCCESS: i32 = 0;
/// Configuration file missing, unreadable or invalid
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// NPI input missing, unreadable or empty
pub const EXIT_INPUT_ERROR: i32 = 3;
/// Checkpoint, staging or export failure
pub const EXIT_FATAL_ERROR: i32 = 5;
/// Stopped by SIGINT/SIGTERM; progress was saved
pub const EXIT_INTERRUPTED: i32 = 130;

/// Maps an error to the process exit code
pub fn exit_code_for(error: &ExtractError) -> i32 {
    match error {
        ExtractError::Configuration(_) => EXIT_CONFIG_ERROR,
        ExtractError::Input(_) => EXIT_INPUT_ERROR,
        _ => EXIT_FATAL_ERROR,
    }
}

/// QPP Extract - CMS QPP Eligibility Extraction Tool
#[derive(Parser, Debug)]
#[command(name = "qpp-extract")]
#[command(version, about, long_about = None)]
#[command(author = "QPP Extract Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "qpp-extract.toml", env = "QPP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "QPP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract eligibility records for every NPI and performance year
    Extract(commands::extract::ExtractArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show per-year checkpoint status
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
