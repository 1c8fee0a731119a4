//! CSV export of the staged tables
//!
//! Each year's staged batches are read once and routed into six writers,
//! one per table, producing `{dir}/{table}_{year}.csv`. Files are written
//! under a `.tmp` name and renamed when complete. Every table file is
//! written, header only when the year has no rows for it.

use super::dictionary::dictionary_entries;
use crate::adapters::storage::{StagedEntry, StagingArea};
use crate::core::normalize::{Row, TableKind};
use crate::domain::{ExtractError, PerformanceYear, Result};
use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// File name of the data dictionary
pub const DATA_DICTIONARY_FILE: &str = "data_dictionary.csv";

/// File name of the per-table row count summary
pub const EXPORT_SUMMARY_FILE: &str = "export_summary.csv";

/// Row count and per-column fill of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub table: TableKind,
    pub rows: u64,
    non_null: Vec<u64>,
}

impl TableStats {
    pub fn new(table: TableKind) -> Self {
        Self {
            table,
            rows: 0,
            non_null: vec![0; table.columns().len()],
        }
    }

    /// Counts a row
    pub fn add(&mut self, row: &Row) {
        self.rows += 1;
        for (count, value) in self.non_null.iter_mut().zip(&row.values) {
            if !value.is_null() {
                *count += 1;
            }
        }
    }

    /// Percentage of rows with a value, per column
    pub fn completeness(&self) -> BTreeMap<&'static str, f64> {
        self.table
            .columns()
            .into_iter()
            .zip(&self.non_null)
            .map(|(column, count)| {
                let pct = if self.rows == 0 {
                    0.0
                } else {
                    *count as f64 / self.rows as f64 * 100.0
                };
                (column, pct)
            })
            .collect()
    }
}

/// Table statistics of one year
#[derive(Debug, Clone)]
pub struct YearTables {
    pub year: PerformanceYear,
    pub tables: BTreeMap<TableKind, TableStats>,
    /// CSV files written, empty when only tallied
    pub files: Vec<PathBuf>,
}

impl YearTables {
    fn new(year: PerformanceYear) -> Self {
        Self {
            year,
            tables: TableKind::ALL
                .into_iter()
                .map(|table| (table, TableStats::new(table)))
                .collect(),
            files: Vec::new(),
        }
    }

    fn add(&mut self, row: &Row) {
        if let Some(stats) = self.tables.get_mut(&row.table) {
            stats.add(row);
        }
    }

    /// Row count of one table
    pub fn rows(&self, table: TableKind) -> u64 {
        self.tables.get(&table).map_or(0, |stats| stats.rows)
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.values().map(|stats| stats.rows).sum()
    }

    /// Row counts keyed by table name
    pub fn row_counts(&self) -> BTreeMap<String, u64> {
        self.tables
            .iter()
            .map(|(table, stats)| (table.to_string(), stats.rows))
            .collect()
    }
}

/// Counts the staged rows of a year without writing any file
///
/// # Errors
///
/// Returns a persistence error if the staged batches cannot be read.
pub fn tally_staged(staging: &StagingArea, year: PerformanceYear) -> Result<YearTables> {
    let mut tallies = YearTables::new(year);
    for entry in staging.entries(year)? {
        if let StagedEntry::Row(row) = entry? {
            tallies.add(&row);
        }
    }
    Ok(tallies)
}

/// One line of `export_summary.csv`
#[derive(Debug, Clone, Serialize)]
struct SummaryLine {
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Table")]
    table: String,
    #[serde(rename = "Record Count")]
    record_count: u64,
    #[serde(rename = "Export Status")]
    status: &'static str,
}

struct TableWriter {
    writer: Writer<File>,
    tmp_path: PathBuf,
    path: PathBuf,
}

/// Writer of the per-table CSV files, data dictionary and export summary
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `{table}_{year}.csv`
    pub fn table_path(&self, table: TableKind, year: PerformanceYear) -> PathBuf {
        self.dir.join(format!("{table}_{year}.csv"))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ExtractError::Export(format!(
                "Failed to create CSV directory {}: {e}",
                self.dir.display()
            ))
        })
    }

    /// Exports every year, then writes the data dictionary and the export
    /// summary
    ///
    /// # Errors
    ///
    /// Returns an export error if any file cannot be written, or a
    /// persistence error if the staged rows cannot be read.
    pub fn export(&self, staging: &StagingArea, years: &[PerformanceYear]) -> Result<Vec<YearTables>> {
        let mut exported = Vec::with_capacity(years.len());
        for year in years {
            exported.push(self.export_year(staging, *year)?);
        }
        self.write_data_dictionary()?;
        self.write_export_summary(&exported)?;
        Ok(exported)
    }

    /// Exports the six tables of one year in a single pass over staging
    ///
    /// # Errors
    ///
    /// See [`CsvExporter::export`].
    pub fn export_year(&self, staging: &StagingArea, year: PerformanceYear) -> Result<YearTables> {
        self.ensure_dir()?;

        let mut writers = BTreeMap::new();
        for table in TableKind::ALL {
            let path = self.table_path(table, year);
            let tmp_path = path.with_extension("csv.tmp");
            let mut writer = Writer::from_path(&tmp_path).map_err(|e| {
                ExtractError::Export(format!("Failed to create {}: {e}", tmp_path.display()))
            })?;
            writer.write_record(table.columns())?;
            writers.insert(
                table,
                TableWriter {
                    writer,
                    tmp_path,
                    path,
                },
            );
        }

        let mut tallies = YearTables::new(year);
        for entry in staging.entries(year)? {
            let StagedEntry::Row(row) = entry? else {
                continue;
            };
            if let Some(target) = writers.get_mut(&row.table) {
                target.writer.write_record(row.to_csv_record())?;
            }
            tallies.add(&row);
        }

        for (table, mut target) in writers {
            target.writer.flush().map_err(|e| {
                ExtractError::Export(format!("Failed to flush {}: {e}", target.tmp_path.display()))
            })?;
            drop(target.writer);
            fs::rename(&target.tmp_path, &target.path).map_err(|e| {
                ExtractError::Export(format!(
                    "Failed to move {} -> {}: {e}",
                    target.tmp_path.display(),
                    target.path.display()
                ))
            })?;
            tracing::info!(
                year = %year,
                table = %table,
                rows = tallies.rows(table),
                path = %target.path.display(),
                "Exported table"
            );
            tallies.files.push(target.path);
        }

        Ok(tallies)
    }

    /// Writes `data_dictionary.csv`: table, column, description, type,
    /// example
    ///
    /// # Errors
    ///
    /// Returns an export error if the file cannot be written.
    pub fn write_data_dictionary(&self) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(DATA_DICTIONARY_FILE);
        let mut writer = Writer::from_path(&path)?;
        for entry in dictionary_entries() {
            writer.serialize(entry)?;
        }
        writer
            .flush()
            .map_err(|e| ExtractError::Export(format!("Failed to flush {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "Data dictionary created");
        Ok(path)
    }

    /// Writes `export_summary.csv` with one line per year and table and a
    /// TOTAL line
    ///
    /// # Errors
    ///
    /// Returns an export error if the file cannot be written.
    pub fn write_export_summary(&self, years: &[YearTables]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(EXPORT_SUMMARY_FILE);
        let mut writer = Writer::from_path(&path)?;

        let mut total = 0;
        for year in years {
            for (table, stats) in &year.tables {
                total += stats.rows;
                writer.serialize(SummaryLine {
                    year: year.year.to_string(),
                    table: table.to_string(),
                    record_count: stats.rows,
                    status: if stats.rows > 0 { "Success" } else { "No Data" },
                })?;
            }
        }
        writer.serialize(SummaryLine {
            year: "TOTAL".to_string(),
            table: "ALL TABLES".to_string(),
            record_count: total,
            status: "Summary",
        })?;
        writer
            .flush()
            .map_err(|e| ExtractError::Export(format!("Failed to flush {}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), total_rows = total, "Export summary created");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::CellValue;
    use tempfile::TempDir;

    fn year() -> PerformanceYear {
        PerformanceYear::new(2023).unwrap()
    }

    fn row(table: TableKind, npi: &str) -> Row {
        let mut values = vec![CellValue::Null; table.columns().len()];
        values[0] = CellValue::from(npi);
        values[1] = CellValue::Int(2023);
        Row { table, values }
    }

    async fn staged(dir: &Path) -> StagingArea {
        let staging = StagingArea::new(dir.join("staging"));
        let mut provider = row(TableKind::Providers, "1234567890");
        let first_name = TableKind::Providers
            .schema()
            .column_index("firstName")
            .unwrap();
        provider.values[first_name] = CellValue::from("Jane, Q.");
        let is_maqi = TableKind::Providers.schema().column_index("isMaqi").unwrap();
        provider.values[is_maqi] = CellValue::Bool(false);

        staging
            .write_batch(
                year(),
                0,
                &[provider, row(TableKind::Organizations, "1234567890")],
                &[],
            )
            .await
            .unwrap();
        staging
    }

    #[tokio::test]
    async fn test_export_year_writes_all_tables() {
        let dir = TempDir::new().unwrap();
        let staging = staged(dir.path()).await;
        let exporter = CsvExporter::new(dir.path().join("csv"));

        let tables = exporter.export_year(&staging, year()).unwrap();
        assert_eq!(tables.files.len(), 6);
        assert_eq!(tables.rows(TableKind::Providers), 1);
        assert_eq!(tables.rows(TableKind::Organizations), 1);
        assert_eq!(tables.rows(TableKind::Apms), 0);
        assert_eq!(tables.total_rows(), 2);

        let providers =
            fs::read_to_string(exporter.table_path(TableKind::Providers, year())).unwrap();
        let mut lines = providers.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("npi,year,firstName,lastName"));
        let data = lines.next().unwrap();
        assert!(data.starts_with("1234567890,2023,\"Jane, Q.\","));
        assert!(data.contains(",FALSE,"));

        let apms = fs::read_to_string(exporter.table_path(TableKind::Apms, year())).unwrap();
        assert_eq!(apms.lines().count(), 1);
        assert!(apms.starts_with("npi,year,org_index,apm_index,"));

        assert!(!dir
            .path()
            .join("csv/providers_2023.csv.tmp")
            .exists());
    }

    #[tokio::test]
    async fn test_export_writes_summary_with_total() {
        let dir = TempDir::new().unwrap();
        let staging = staged(dir.path()).await;
        let exporter = CsvExporter::new(dir.path().join("csv"));

        exporter.export(&staging, &[year()]).unwrap();

        let summary = fs::read_to_string(exporter.dir().join(EXPORT_SUMMARY_FILE)).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Year,Table,Record Count,Export Status");
        assert!(lines.contains(&"2023,providers,1,Success"));
        assert!(lines.contains(&"2023,apms,0,No Data"));
        assert_eq!(*lines.last().unwrap(), "TOTAL,ALL TABLES,2,Summary");
        assert_eq!(lines.len(), 1 + 6 + 1);

        let dictionary = fs::read_to_string(exporter.dir().join(DATA_DICTIONARY_FILE)).unwrap();
        assert!(dictionary.starts_with("table,column,description,type,example"));
    }

    #[tokio::test]
    async fn test_tally_and_completeness() {
        let dir = TempDir::new().unwrap();
        let staging = staged(dir.path()).await;

        let tables = tally_staged(&staging, year()).unwrap();
        assert!(tables.files.is_empty());
        assert_eq!(tables.row_counts()["providers"], 1);

        let completeness = tables.tables[&TableKind::Providers].completeness();
        assert_eq!(completeness["npi"], 100.0);
        assert_eq!(completeness["firstName"], 100.0);
        assert_eq!(completeness["lastName"], 0.0);
    }
}
