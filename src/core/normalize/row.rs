//! Normalized row types

use super::schema::TableKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar value of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// CSV rendering: booleans as TRUE/FALSE, null as the empty string
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv_field())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

/// One row of a normalized table
///
/// `values` line up with [`TableKind::columns`]: key columns first, then
/// the schema fields, then derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub table: TableKind,
    pub values: Vec<CellValue>,
}

impl Row {
    /// Value of a column by name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        let index = self.table.schema().column_index(column)?;
        self.values.get(index)
    }

    /// Column name and value pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CellValue)> {
        self.table.columns().into_iter().zip(self.values.iter())
    }

    /// Values rendered for a CSV record
    pub fn to_csv_record(&self) -> Vec<String> {
        self.values.iter().map(CellValue::to_csv_field).collect()
    }
}

/// A field-scoped validation problem found while normalizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub npi: String,
    pub year: u16,
    pub table: TableKind,
    pub field: String,
    /// JSON pointer of the offending value within the record
    pub location: String,
    /// Offending value as compact JSON, `None` when it was absent
    pub value: Option<String>,
    pub reason: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} {}.{} ({}): {}",
            self.npi, self.year, self.table, self.field, self.location, self.reason
        )?;
        if let Some(value) = &self.value {
            write!(f, " [value: {value}]")?;
        }
        Ok(())
    }
}

/// All rows produced from one raw record, across the six tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    pub rows: Vec<Row>,
}

impl NormalizedRecord {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one table, in emission order
    pub fn table(&self, table: TableKind) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(move |row| row.table == table)
    }

    pub fn count(&self, table: TableKind) -> usize {
        self.table(table).count()
    }
}

/// Normalizer output for one raw record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalization {
    pub record: NormalizedRecord,
    pub issues: Vec<ValidationIssue>,
}
