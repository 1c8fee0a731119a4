//! NPI list reader
//!
//! Reads the identifier column from a CSV file, trims every value and drops
//! blank, malformed and duplicate entries while keeping first-seen order.
//! The delimiter is detected from the header line (comma, semicolon, tab or
//! pipe).

use crate::domain::ids::is_valid_npi;
use crate::domain::{ExtractError, Npi, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Counts gathered while reading the NPI list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NpiReadStats {
    /// Data rows read (header excluded)
    pub total_rows: u64,
    pub valid: u64,
    pub invalid: u64,
    pub duplicates: u64,
    pub blank: u64,
}

/// A rejected value and the 1-based file line it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedNpi {
    pub line: u64,
    pub value: String,
}

/// Result of reading an NPI list
#[derive(Debug, Clone, Default)]
pub struct NpiList {
    /// Distinct valid NPIs in first-seen order
    pub npis: Vec<Npi>,
    pub stats: NpiReadStats,
    pub invalid: Vec<RejectedNpi>,
    pub duplicates: Vec<RejectedNpi>,
}

/// Reader for the NPI input CSV
#[derive(Debug, Clone)]
pub struct NpiReader {
    path: PathBuf,
    column: String,
}

impl NpiReader {
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, validates and deduplicates the NPI column
    ///
    /// # Errors
    ///
    /// Returns an input error if the file cannot be opened or parsed, or if
    /// the configured column is missing (the message lists the columns that
    /// are present).
    pub fn read(&self) -> Result<NpiList> {
        let mut file = File::open(&self.path).map_err(|e| {
            ExtractError::Input(format!(
                "Failed to open NPI file {}: {e}",
                self.path.display()
            ))
        })?;
        let delimiter = detect_delimiter(&mut file).map_err(|e| {
            ExtractError::Input(format!(
                "Failed to read NPI file {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::info!(
            path = %self.path.display(),
            column = %self.column,
            delimiter = %char::from(delimiter).escape_default(),
            "Reading NPIs"
        );
        let list = self.read_from(file, delimiter)?;

        tracing::info!(
            total_rows = list.stats.total_rows,
            valid = list.stats.valid,
            invalid = list.stats.invalid,
            duplicates = list.stats.duplicates,
            blank = list.stats.blank,
            "NPI list loaded"
        );
        Ok(list)
    }

    fn read_from<R: Read>(&self, input: R, delimiter: u8) -> Result<NpiList> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| ExtractError::Input(format!("Failed to read NPI file headers: {e}")))?
            .clone();
        let index = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == self.column)
            .ok_or_else(|| {
                let available: Vec<&str> = headers.iter().collect();
                ExtractError::Input(format!(
                    "NPI column '{}' not found. Available columns: {}",
                    self.column,
                    available.join(", ")
                ))
            })?;

        let mut list = NpiList::default();
        let mut seen = HashSet::new();

        for record in reader.records() {
            let record = record
                .map_err(|e| ExtractError::Input(format!("Failed to read NPI row: {e}")))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            list.stats.total_rows += 1;

            let value = record.get(index).unwrap_or_default().trim();
            if value.is_empty() {
                list.stats.blank += 1;
                tracing::debug!(line, "Blank NPI");
                continue;
            }

            if !is_valid_npi(value) {
                list.stats.invalid += 1;
                tracing::warn!(line, value, "Invalid NPI");
                list.invalid.push(RejectedNpi {
                    line,
                    value: value.to_string(),
                });
                continue;
            }

            if !seen.insert(value.to_string()) {
                list.stats.duplicates += 1;
                tracing::debug!(line, value, "Duplicate NPI");
                list.duplicates.push(RejectedNpi {
                    line,
                    value: value.to_string(),
                });
                continue;
            }

            let npi = Npi::new(value).map_err(ExtractError::Input)?;
            list.npis.push(npi);
            list.stats.valid += 1;
        }

        Ok(list)
    }
}

/// Picks the delimiter that occurs most often in the header line,
/// defaulting to a comma, and rewinds the file
fn detect_delimiter(file: &mut File) -> std::io::Result<u8> {
    let mut header = String::new();
    BufReader::new(&mut *file).read_line(&mut header)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(delimiter_for(&header))
}

fn delimiter_for(header: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .into_iter()
        .map(|d| (d, header.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}
