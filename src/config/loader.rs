//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ExtractConfig;
use crate::domain::errors::ExtractError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExtractConfig
/// 4. Applies environment variable overrides (QPP_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`ExtractError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or a value is
/// out of range.
///
/// # Examples
///
/// ```no_run
/// use qpp_extract::config::loader::load_config;
///
/// let config = load_config("qpp-extract.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExtractConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExtractError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExtractError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<ExtractConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ExtractConfig = toml::from_str(&contents)
        .map_err(|e| ExtractError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ExtractError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExtractError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        // Placeholders inside comments are left alone
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExtractError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Parses a boolean override, rejecting anything but true/false
fn parse_bool(name: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|_| {
        ExtractError::Configuration(format!("{name} must be true or false, got '{value}'"))
    })
}

/// Parses a numeric override
fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ExtractError::Configuration(format!("{name} must be a number, got '{value}'")))
}

/// Applies environment variable overrides using the QPP_* prefix
///
/// Environment variables follow the pattern: QPP_<SECTION>_<KEY>
/// For example: QPP_API_BASE_URL, QPP_PROCESSING_YEARS
fn apply_env_overrides(config: &mut ExtractConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("QPP_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("QPP_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_bool("QPP_APPLICATION_DRY_RUN", &val)?;
    }

    // API overrides
    if let Ok(val) = std::env::var("QPP_API_BASE_URL") {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("QPP_API_TIMEOUT_SECONDS") {
        config.api.timeout_seconds = parse_number("QPP_API_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("QPP_API_RUN_NUMBER") {
        config.api.run_number = Some(parse_number("QPP_API_RUN_NUMBER", &val)?);
    }
    if let Ok(val) = std::env::var("QPP_API_MAX_RETRIES") {
        config.api.retry.max_retries = parse_number("QPP_API_MAX_RETRIES", &val)?;
    }

    // Rate limit overrides
    if let Ok(val) = std::env::var("QPP_RATE_LIMIT_REQUESTS_PER_SECOND") {
        config.rate_limit.requests_per_second =
            parse_number("QPP_RATE_LIMIT_REQUESTS_PER_SECOND", &val)?;
    }
    if let Ok(val) = std::env::var("QPP_RATE_LIMIT_BURST") {
        config.rate_limit.burst = parse_number("QPP_RATE_LIMIT_BURST", &val)?;
    }

    // Processing overrides
    if let Ok(val) = std::env::var("QPP_PROCESSING_YEARS") {
        config.processing.years = parse_years(&val)?;
    }
    if let Ok(val) = std::env::var("QPP_PROCESSING_BATCH_SIZE") {
        config.processing.batch_size = parse_number("QPP_PROCESSING_BATCH_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("QPP_PROCESSING_MAX_WORKERS") {
        config.processing.max_workers = parse_number("QPP_PROCESSING_MAX_WORKERS", &val)?;
    }
    if let Ok(val) = std::env::var("QPP_PROCESSING_PARALLEL_YEARS") {
        config.processing.parallel_years = parse_bool("QPP_PROCESSING_PARALLEL_YEARS", &val)?;
    }

    // Input overrides
    if let Ok(val) = std::env::var("QPP_INPUT_NPI_CSV_PATH") {
        config.input.npi_csv_path = val;
    }
    if let Ok(val) = std::env::var("QPP_INPUT_NPI_COLUMN") {
        config.input.npi_column = val;
    }

    // Output overrides
    if let Ok(val) = std::env::var("QPP_OUTPUT_BASE_DIR") {
        config.output.base_dir = val;
    }
    if let Ok(val) = std::env::var("QPP_OUTPUT_GENERATE_CSV") {
        config.output.generate_csv = parse_bool("QPP_OUTPUT_GENERATE_CSV", &val)?;
    }
    if let Ok(val) = std::env::var("QPP_OUTPUT_SAVE_RAW_RESPONSES") {
        config.output.save_raw_responses = parse_bool("QPP_OUTPUT_SAVE_RAW_RESPONSES", &val)?;
    }

    // State overrides
    if let Ok(val) = std::env::var("QPP_STATE_CHECKPOINT_DIR") {
        config.state.checkpoint_dir = val;
    }
    if let Ok(val) = std::env::var("QPP_STATE_RESUME") {
        config.state.resume = parse_bool("QPP_STATE_RESUME", &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("QPP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool("QPP_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("QPP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

/// Parses a comma-separated year list such as "2023,2024"
pub fn parse_years(value: &str) -> Result<Vec<u16>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>().map_err(|_| {
                ExtractError::Configuration(format!("Invalid performance year '{s}'"))
            })
        })
        .collect()
}
