//! Normalization of eligibility records into six relational tables

pub mod normalizer;
pub mod row;
pub mod schema;

pub use normalizer::{json_type_name, Normalizer};
pub use row::{CellValue, Normalization, NormalizedRecord, Row, ValidationIssue};
pub use schema::{TableKind, TableSchema};
