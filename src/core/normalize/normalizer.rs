//! JSON-to-relational normalizer
//!
//! Walks one eligibility record along the declarative schema and emits rows
//! for the six tables. Pure: the same [`RawRecord`] always yields the same
//! rows and the same issues.

use super::row::{CellValue, Normalization, Row, ValidationIssue};
use super::schema::{
    DerivedColumn, FieldSpec, Source, TableKind, TableSchema, ValueKind, DATA_SOURCE, NPI_FIELD,
    PROVIDERS,
};
use crate::domain::RawRecord;
use chrono::SecondsFormat;
use serde_json::Value;

const MAX_ISSUE_VALUE_LEN: usize = 200;

/// A value that could not be converted, with the reason
struct Invalid {
    location: String,
    value: String,
    reason: String,
}

/// Per-record walk state
struct Walk<'a> {
    root: &'a Value,
    npi: String,
    year: u16,
    processed_at: String,
    out: Normalization,
}

impl Walk<'_> {
    fn issue(
        &mut self,
        table: TableKind,
        field: &str,
        location: String,
        value: Option<String>,
        reason: impl Into<String>,
    ) {
        self.out.issues.push(ValidationIssue {
            npi: self.npi.clone(),
            year: self.year,
            table,
            field: field.to_string(),
            location,
            value,
            reason: reason.into(),
        });
    }
}

/// Converts raw records into normalized rows
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    _private: (),
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes one record
    ///
    /// Non-success records and records without a valid `npi` yield no rows.
    /// A row missing a required field is omitted; when that row is an
    /// organization its scenario, APM and virtual group rows go with it.
    pub fn normalize(&self, raw: &RawRecord) -> Normalization {
        let body = match (&raw.body, raw.is_success()) {
            (Some(body), true) => body,
            _ => return Normalization::default(),
        };

        let mut walk = Walk {
            root: body,
            npi: raw.item.npi.to_string(),
            year: raw.item.year.get(),
            processed_at: raw.fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            out: Normalization::default(),
        };

        let npi = match extract(&NPI_FIELD, body, "", body) {
            Ok(CellValue::Text(npi)) => npi,
            Ok(_) => {
                walk.issue(
                    TableKind::Providers,
                    NPI_FIELD.column,
                    NPI_FIELD.pointer.to_string(),
                    None,
                    "missing required field",
                );
                return walk.out;
            }
            Err(invalid) => {
                walk.issue(
                    TableKind::Providers,
                    NPI_FIELD.column,
                    invalid.location,
                    Some(invalid.value),
                    invalid.reason,
                );
                return walk.out;
            }
        };

        if npi != walk.npi {
            let requested = std::mem::replace(&mut walk.npi, npi.clone());
            walk.issue(
                TableKind::Providers,
                NPI_FIELD.column,
                NPI_FIELD.pointer.to_string(),
                Some(format!("\"{npi}\"")),
                format!("npi does not match requested npi {requested}"),
            );
        }

        let keys = vec![CellValue::Text(npi), CellValue::Int(i64::from(walk.year))];
        emit_row(&mut walk, &PROVIDERS, body, "", keys.clone());
        descend(&mut walk, None, body, "", &keys);

        walk.out
    }
}

/// Emits rows for every child table of `parent` found under `node`
fn descend(
    walk: &mut Walk<'_>,
    parent: Option<TableKind>,
    node: &Value,
    node_path: &str,
    keys: &[CellValue],
) {
    for schema in TableSchema::children_of(parent) {
        match schema.source {
            Source::Root => {}
            Source::Object(pointer) => {
                let path = format!("{node_path}{pointer}");
                match node.pointer(pointer) {
                    None | Some(Value::Null) => {}
                    Some(child @ Value::Object(_)) => {
                        if emit_row(walk, schema, child, &path, keys.to_vec()) {
                            descend(walk, Some(schema.kind), child, &path, keys);
                        }
                    }
                    Some(other) => {
                        let reason = format!("expected object, got {}", json_type_name(other));
                        walk.issue(schema.kind, pointer, path, Some(compact(other)), reason);
                    }
                }
            }
            Source::Array(pointer) => match node.pointer(pointer) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        let path = format!("{node_path}{pointer}/{index}");
                        let mut child_keys = keys.to_vec();
                        child_keys.push(CellValue::Int(index as i64));

                        if !item.is_object() {
                            let reason =
                                format!("expected object, got {}", json_type_name(item));
                            walk.issue(schema.kind, pointer, path, Some(compact(item)), reason);
                            continue;
                        }
                        if emit_row(walk, schema, item, &path, child_keys.clone()) {
                            descend(walk, Some(schema.kind), item, &path, &child_keys);
                        }
                    }
                }
                Some(other) => {
                    let path = format!("{node_path}{pointer}");
                    let reason = format!("expected array, got {}", json_type_name(other));
                    walk.issue(schema.kind, pointer, path, Some(compact(other)), reason);
                }
            },
        }
    }
}

/// Builds one row; returns false when a required field is missing or invalid
fn emit_row(
    walk: &mut Walk<'_>,
    schema: &TableSchema,
    node: &Value,
    node_path: &str,
    keys: Vec<CellValue>,
) -> bool {
    let mut values = keys;
    values.reserve(schema.fields.len() + schema.derived.len());
    let mut complete = true;

    for field in schema.fields {
        match extract(field, node, node_path, walk.root) {
            Ok(CellValue::Null) if field.required => {
                complete = false;
                walk.issue(
                    schema.kind,
                    field.column,
                    format!("{node_path}{}", field.pointer),
                    None,
                    "missing required field",
                );
                values.push(CellValue::Null);
            }
            Ok(value) => values.push(value),
            Err(invalid) => {
                if field.required {
                    complete = false;
                }
                walk.issue(
                    schema.kind,
                    field.column,
                    invalid.location,
                    Some(invalid.value),
                    invalid.reason,
                );
                values.push(CellValue::Null);
            }
        }
    }

    for derived in schema.derived {
        values.push(match derived {
            DerivedColumn::ProcessedAt => CellValue::Text(walk.processed_at.clone()),
            DerivedColumn::DataSource => CellValue::Text(DATA_SOURCE.to_string()),
        });
    }

    if complete {
        walk.out.record.rows.push(Row {
            table: schema.kind,
            values,
        });
    }
    complete
}

/// Reads one field, trying the fallback pointer when the primary is absent
fn extract(
    field: &FieldSpec,
    node: &Value,
    node_path: &str,
    root: &Value,
) -> Result<CellValue, Invalid> {
    let present = |v: &&Value| !v.is_null();
    let (raw, location) = match node.pointer(field.pointer).filter(present) {
        Some(value) => (Some(value), format!("{node_path}{}", field.pointer)),
        None => match field.fallback {
            Some(fallback) => (root.pointer(fallback).filter(present), fallback.to_string()),
            None => (None, format!("{node_path}{}", field.pointer)),
        },
    };

    let Some(raw) = raw else {
        return Ok(CellValue::Null);
    };

    convert(field, raw).map_err(|reason| Invalid {
        location,
        value: compact(raw),
        reason,
    })
}

fn convert(field: &FieldSpec, raw: &Value) -> Result<CellValue, String> {
    let constraint = field.constraint;
    match field.kind {
        ValueKind::Text => {
            let text = match raw {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => return Err(format!("expected text, got {}", json_type_name(other))),
            };
            constraint.check_text(&text)?;
            Ok(CellValue::Text(text))
        }
        ValueKind::Integer => {
            let number = match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| {
                        n.as_f64()
                            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                            .map(|f| f as i64)
                    })
                    .ok_or_else(|| format!("expected integer, got {n}"))?,
                other => return Err(format!("expected integer, got {}", json_type_name(other))),
            };
            constraint.check_int(number)?;
            Ok(CellValue::Int(number))
        }
        ValueKind::Float => match raw {
            Value::Number(n) => n
                .as_f64()
                .map(CellValue::Float)
                .ok_or_else(|| format!("expected number, got {n}")),
            other => Err(format!("expected number, got {}", json_type_name(other))),
        },
        ValueKind::Boolean => match raw {
            Value::Bool(b) => Ok(CellValue::Bool(*b)),
            other => Err(format!("expected boolean, got {}", json_type_name(other))),
        },
        ValueKind::TextList => {
            let items = raw
                .as_array()
                .ok_or_else(|| format!("expected array, got {}", json_type_name(raw)))?;
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let text = item.as_str().ok_or_else(|| {
                    format!("expected array of text, found {}", json_type_name(item))
                })?;
                constraint.check_text(text)?;
                parts.push(text);
            }
            Ok(joined(&parts))
        }
        ValueKind::CodeList { key } => {
            let items = raw
                .as_array()
                .ok_or_else(|| format!("expected array, got {}", json_type_name(raw)))?;
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let object = item.as_object().ok_or_else(|| {
                    format!("expected array of objects, found {}", json_type_name(item))
                })?;
                match object.get(key) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(code)) => {
                        constraint.check_text(code)?;
                        parts.push(code.as_str());
                    }
                    Some(other) => {
                        return Err(format!(
                            "expected text `{key}`, got {}",
                            json_type_name(other)
                        ))
                    }
                }
            }
            Ok(joined(&parts))
        }
    }
}

fn joined(parts: &[&str]) -> CellValue {
    if parts.is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(parts.join(", "))
    }
}

fn compact(value: &Value) -> String {
    let text = value.to_string();
    if text.len() <= MAX_ISSUE_VALUE_LEN {
        return text;
    }
    let mut end = MAX_ISSUE_VALUE_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// JSON type name used in validation messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
