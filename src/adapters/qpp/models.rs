//! Wire models for the QPP Eligibility API
//!
//! Eligibility records stay as `serde_json::Value`; the normalizer reads
//! them through JSON pointers. Only the envelopes are typed here.

use crate::core::normalize::json_type_name;
use serde::Deserialize;
use serde_json::Value;

/// Success envelope: `{"data": {...}}`
#[derive(Debug, Deserialize)]
pub struct EligibilityEnvelope {
    pub data: Value,
}

impl EligibilityEnvelope {
    /// Decodes a 200 body and returns the inner record
    ///
    /// The record must be a JSON object.
    pub fn unwrap_record(body: &str) -> Result<Value, String> {
        let envelope: EligibilityEnvelope = serde_json::from_str(body)
            .map_err(|e| format!("body is not an eligibility envelope: {e}"))?;
        match envelope.data {
            Value::Object(_) => Ok(envelope.data),
            other => Err(format!(
                "expected `data` to be an object, got {}",
                json_type_name(&other)
            )),
        }
    }
}

/// Error envelope: `{"error": {"type": ..., "message": ...}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Best-effort message from an error body, falling back to the raw text
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match (envelope.error.kind, envelope.error.message) {
                (Some(kind), Some(message)) => format!("{kind}: {message}"),
                (None, Some(message)) => message,
                (Some(kind), None) => kind,
                (None, None) => truncate_for_log(body),
            },
            Err(_) => truncate_for_log(body),
        }
    }
}

/// Shortens a response body for log and error messages
pub fn truncate_for_log(text: &str) -> String {
    let trimmed = text.trim();
    let max_len = 300usize;
    if trimmed.len() <= max_len {
        trimmed.to_string()
    } else {
        let mut end = max_len;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_record() {
        let record =
            EligibilityEnvelope::unwrap_record(r#"{"data": {"npi": "1234567890"}}"#).unwrap();
        assert_eq!(record["npi"], "1234567890");
    }

    #[test]
    fn test_unwrap_record_rejects_bad_bodies() {
        assert!(EligibilityEnvelope::unwrap_record("<html>").is_err());
        assert!(EligibilityEnvelope::unwrap_record(r#"{"npi": "1234567890"}"#).is_err());
        let err = EligibilityEnvelope::unwrap_record(r#"{"data": []}"#).unwrap_err();
        assert!(err.contains("array"));
    }

    #[test]
    fn test_error_message_from_body() {
        let body = r#"{"error": {"type": "ValidationError", "message": "year is invalid"}}"#;
        assert_eq!(
            ErrorEnvelope::message_from(body),
            "ValidationError: year is invalid"
        );
        assert_eq!(ErrorEnvelope::message_from("plain text"), "plain text");
    }

    #[test]
    fn test_truncate_for_log() {
        let long = "x".repeat(400);
        let truncated = truncate_for_log(&long);
        assert_eq!(truncated.len(), 303);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_for_log("  short  "), "short");
    }
}
