//! Data dictionary generated from the table schema

use crate::core::normalize::schema::{key_column_description, DerivedColumn, TableKind, DATA_SOURCE};
use serde::Serialize;

/// One line of `data_dictionary.csv`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryEntry {
    pub table: &'static str,
    pub column: &'static str,
    pub description: String,
    #[serde(rename = "type")]
    pub data_type: &'static str,
    pub example: String,
}

/// Every column of every table, in export order
pub fn dictionary_entries() -> Vec<DictionaryEntry> {
    let mut entries = Vec::new();
    for table in TableKind::ALL {
        let schema = table.schema();

        for column in schema.key_columns() {
            let (data_type, example) = match column {
                "npi" => ("Text", "1234567890"),
                "year" => ("Integer", "2023"),
                _ => ("Integer", "0"),
            };
            entries.push(DictionaryEntry {
                table: schema.name,
                column,
                description: key_column_description(column).to_string(),
                data_type,
                example: example.to_string(),
            });
        }

        for field in schema.fields {
            entries.push(DictionaryEntry {
                table: schema.name,
                column: field.column,
                description: field.description(),
                data_type: field.kind.type_name(),
                example: field.example(),
            });
        }

        for derived in schema.derived {
            let (data_type, example) = match derived {
                DerivedColumn::ProcessedAt => ("DateTime", "2024-01-15T10:30:00.000Z"),
                DerivedColumn::DataSource => ("Text", DATA_SOURCE),
            };
            entries.push(DictionaryEntry {
                table: schema.name,
                column: derived.column(),
                description: derived.description().to_string(),
                data_type,
                example: example.to_string(),
            });
        }
    }
    entries
}
