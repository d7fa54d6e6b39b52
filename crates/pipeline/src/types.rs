//! Shared value types for the generation domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (an [`Artifact`]'s counts always describe
//! its text, token counts are non-negative integers) and participate in
//! domain computations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token accounting
// ---------------------------------------------------------------------------

/// Number of tokens consumed in an LLM API call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token usage reported by the provider for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the rendered prompt.
    pub prompt: TokenCount,
    /// Tokens in the generated completion.
    pub completion: TokenCount,
    /// Total tokens billed for the call.
    pub total: TokenCount,
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// The final text produced by the generation stage.
///
/// The character and line counts are computed once at construction and always
/// describe `text`; the review stage reads an artifact but never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    text: String,
    chars: usize,
    lines: usize,
}

impl Artifact {
    /// Wraps the unwrapped text of the generation stage.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().count();
        let lines = text.lines().count();
        Self { text, chars, lines }
    }

    /// Returns the artifact text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of Unicode scalar values in the text.
    pub fn char_count(&self) -> usize {
        self.chars
    }

    /// Number of lines in the text.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Consumes the artifact and returns its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// One free-text observation reported by the review stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFinding {
    /// Context field the finding was read from (e.g. `"syntax_errors"`).
    pub field: String,
    /// Operator-facing label (e.g. `"Syntax errors"`).
    pub label: String,
    /// The reviewer's text for this field.
    pub message: String,
}

/// The advisory judgement the review stage makes about an [`Artifact`].
///
/// A verdict is reported to the operator; it never causes rejection, retry, or
/// regeneration of the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    /// `true` when the reviewer considers the artifact ready to use.
    pub approved: bool,
    /// Raw value of the verdict field as the reviewer wrote it (e.g. `"yes"`).
    pub verdict: String,
    /// Free-text issue fields, in schema order.
    pub findings: Vec<ReviewFinding>,
    /// Reviewer recommendations, `None` when absent or empty.
    pub recommendations: Option<String>,
    /// `true` when the verdict was built from the review stage's defaults
    /// because its output could not be decoded.
    pub from_fallback: bool,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Formats the timestamp as `YYYY-MM-DD HH:MM:SS UTC` for file headers.
    pub fn to_header_string(self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn artifact_counts_describe_its_text() {
        let artifact = Artifact::new("import os\nprint('привет')\n");
        assert_eq!(artifact.line_count(), 2);
        assert_eq!(artifact.char_count(), 26);
    }

    #[test]
    fn empty_artifact_has_no_lines() {
        let artifact = Artifact::new("");
        assert_eq!(artifact.line_count(), 0);
        assert_eq!(artifact.char_count(), 0);
    }

    #[test]
    fn header_string_is_second_precision() {
        let ts = Timestamp::from_utc(Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap());
        assert_eq!(ts.to_header_string(), "2024-03-09 07:05:01 UTC");
    }
}
