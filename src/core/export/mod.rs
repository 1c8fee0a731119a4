//! CSV export of the staged rows
//!
//! This module writes the six normalized tables per year, the data
//! dictionary and the export summary.

pub mod dictionary;
pub mod tables;

pub use dictionary::{dictionary_entries, DictionaryEntry};
pub use tables::{
    tally_staged, CsvExporter, TableStats, YearTables, DATA_DICTIONARY_FILE, EXPORT_SUMMARY_FILE,
};
