//! Structured extraction of stage output.
//!
//! [`extract`] turns raw model text into the field mapping a stage promised.
//! Decoding problems never escape this module: a text that cannot be decoded
//! yields [`StageOutcome::Fallback`] carrying the stage's declared defaults.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::unwrap::{unwrap_artifact, FENCE};

/// Result of one stage invocation.
///
/// Both variants carry the same kind of field mapping; the tag records where
/// the fields came from and is used only for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Fields decoded from the model's output, verbatim.
    Structured {
        /// Decoded fields. Keys the model omitted are absent, not defaulted.
        fields: Map<String, Value>,
    },
    /// The stage's declared defaults, used because decoding failed.
    Fallback {
        /// Exactly the stage's default mapping.
        fields: Map<String, Value>,
        /// Why decoding failed.
        cause: String,
    },
}

impl StageOutcome {
    /// The fields to merge into the pipeline context.
    pub fn fields(&self) -> &Map<String, Value> {
        match self {
            Self::Structured { fields } | Self::Fallback { fields, .. } => fields,
        }
    }

    /// Consumes the outcome, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Self::Structured { fields } | Self::Fallback { fields, .. } => fields,
        }
    }

    /// Returns `true` for [`StageOutcome::Fallback`].
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The decode failure, for fallback outcomes.
    pub fn fallback_cause(&self) -> Option<&str> {
        match self {
            Self::Fallback { cause, .. } => Some(cause),
            Self::Structured { .. } => None,
        }
    }
}

/// Why a model response could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
enum DecodeError {
    #[error("response was empty")]
    Empty,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("JSON object has none of the expected fields ({0})")]
    NoExpectedField(String),
}

/// Decodes `raw` into a field mapping shaped like `defaults`.
///
/// Accepts a bare JSON object, an object inside a `json` (or untagged) fence,
/// or an object embedded in surrounding prose. The object must contain at
/// least one of the keys of `defaults`; any object is accepted when `defaults`
/// is empty.
///
/// On success the decoded object is returned verbatim as
/// [`StageOutcome::Structured`]. On failure the result is
/// [`StageOutcome::Fallback`] whose fields equal `defaults` exactly.
pub fn extract(raw: &str, defaults: &Map<String, Value>) -> StageOutcome {
    match decode_object(raw, defaults) {
        Ok(fields) => StageOutcome::Structured { fields },
        Err(err) => {
            tracing::debug!(error = %err, "structured decode failed; substituting defaults");
            StageOutcome::Fallback {
                fields: defaults.clone(),
                cause: err.to_string(),
            }
        }
    }
}

fn decode_object(raw: &str, defaults: &Map<String, Value>) -> Result<Map<String, Value>, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }

    // A bare object wins even when its string values quote fenced code.
    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(first) => fenced_value(trimmed)
            .or_else(|| embedded_value(trimmed))
            .ok_or_else(|| DecodeError::InvalidJson(first.to_string()))?,
    };

    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject(kind_of(&value)));
    };

    if !defaults.is_empty() && !defaults.keys().any(|key| fields.contains_key(key)) {
        let expected = defaults.keys().cloned().collect::<Vec<_>>().join(", ");
        return Err(DecodeError::NoExpectedField(expected));
    }

    Ok(fields)
}

/// The object inside the first fence of `text`, preferring a `json` tag.
fn fenced_value(text: &str) -> Option<Value> {
    if !text.contains(FENCE) {
        return None;
    }
    let inner = unwrap_artifact(text, Some("json"));
    serde_json::from_str::<Value>(&inner)
        .ok()
        .filter(Value::is_object)
        .or_else(|| embedded_value(&inner))
}

fn embedded_value(text: &str) -> Option<Value> {
    embedded_object(text).and_then(|slice| serde_json::from_str::<Value>(slice).ok())
}

/// The outermost `{ ... }` span of `text`, if any.
fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Map<String, Value> {
        match json!({
            "framework_version": "aiogram 3.x",
            "database": "none",
            "state_management": "none"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn well_formed_json_is_taken_verbatim() {
        let raw = r#"{"framework_version": "aiogram 3.4", "database": "sqlite", "state_management": "FSM"}"#;
        let outcome = extract(raw, &defaults());
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.fields()["database"], json!("sqlite"));
        assert_eq!(outcome.fields().len(), 3);
    }

    #[test]
    fn missing_keys_are_not_backfilled() {
        let outcome = extract(r#"{"database": "postgresql", "extra": 1}"#, &defaults());
        let fields = outcome.fields();
        assert_eq!(fields.len(), 2);
        assert!(!fields.contains_key("framework_version"));
        assert_eq!(fields["extra"], json!(1));
    }

    #[test]
    fn fenced_json_is_decoded() {
        let raw = "Sure!\n```json\n{\"database\": \"sqlite\"}\n```";
        let outcome = extract(raw, &defaults());
        assert_eq!(outcome.fields()["database"], json!("sqlite"));
    }

    #[test]
    fn bare_json_quoting_fenced_code_is_taken_verbatim() {
        let defaults = match json!({"is_valid": "yes", "recommendations": "ok"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let raw = r#"{"is_valid": "no", "recommendations": "Wrap startup in ```python\nasyncio.run(main())\n```"}"#;
        let outcome = extract(raw, &defaults);
        assert!(!outcome.is_fallback(), "cause: {:?}", outcome.fallback_cause());
        assert_eq!(outcome.fields()["is_valid"], json!("no"));
        assert_eq!(
            outcome.fields()["recommendations"],
            json!("Wrap startup in ```python\nasyncio.run(main())\n```")
        );
    }

    #[test]
    fn prose_around_json_quoting_fenced_code_is_decoded() {
        let raw = "Review:\n{\"database\": \"use ```sqlite3``` here\"}\nThanks";
        let outcome = extract(raw, &defaults());
        assert!(!outcome.is_fallback(), "cause: {:?}", outcome.fallback_cause());
        assert_eq!(outcome.fields()["database"], json!("use ```sqlite3``` here"));
    }

    #[test]
    fn json_embedded_in_prose_is_decoded() {
        let raw = "Here you go: {\"database\": \"none\", \"state_management\": \"memory\"} Hope it helps.";
        let outcome = extract(raw, &defaults());
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.fields()["state_management"], json!("memory"));
    }

    #[test]
    fn garbage_yields_exact_defaults() {
        for raw in ["", "   ", "not json at all", "{broken", "[1, 2, 3]", "\"text\"", "{}"] {
            let outcome = extract(raw, &defaults());
            assert!(outcome.is_fallback(), "expected fallback for {raw:?}");
            assert_eq!(outcome.fields(), &defaults(), "fields for {raw:?}");
            assert!(outcome.fallback_cause().is_some());
        }
    }

    #[test]
    fn object_without_expected_keys_is_non_conforming() {
        let outcome = extract(r#"{"unrelated": "value"}"#, &defaults());
        assert!(outcome.is_fallback());
        assert!(outcome
            .fallback_cause()
            .is_some_and(|cause| cause.contains("none of the expected fields")));
    }

    #[test]
    fn any_object_conforms_to_empty_defaults() {
        let outcome = extract(r#"{"anything": true}"#, &Map::new());
        assert!(!outcome.is_fallback());
    }
}
