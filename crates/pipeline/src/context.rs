//! The brief that starts a run and the context that accumulates stage output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{template::display_value, PipelineError};

/// Context key under which the optional auxiliary source text is seeded.
pub const SOURCE_TEXT_KEY: &str = "source_text";

/// The operator's input to a pipeline run.
///
/// Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    subject: String,
    source_text: Option<String>,
}

impl Brief {
    /// Creates a brief from its subject (bot description, post topic).
    ///
    /// Fails with [`PipelineError::Precondition`] when the subject is blank.
    pub fn new(subject: impl Into<String>) -> Result<Self, PipelineError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(PipelineError::Precondition {
                message: "the brief must not be empty".to_string(),
            });
        }
        Ok(Self {
            subject,
            source_text: None,
        })
    }

    /// Attaches auxiliary source material. Blank text is treated as absent.
    #[must_use]
    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.source_text = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
        self
    }

    /// The brief's subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The auxiliary source text, if any.
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }
}

/// Append-only mapping from field name to value, local to one run.
///
/// Seeded from the [`Brief`] and extended by every stage. Keys are never
/// removed; a later write to an existing key replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineContext {
    fields: Map<String, Value>,
}

impl PipelineContext {
    /// Seeds a context from `brief`, storing the subject under `subject_key`
    /// and the source text (when present) under [`SOURCE_TEXT_KEY`].
    pub fn seed(brief: &Brief, subject_key: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(subject_key.to_string(), Value::String(brief.subject.clone()));
        if let Some(source) = &brief.source_text {
            fields.insert(SOURCE_TEXT_KEY.to_string(), Value::String(source.clone()));
        }
        Self { fields }
    }

    /// Merges a stage's fields. Returns the keys whose earlier values were
    /// replaced.
    pub fn merge(&mut self, fields: Map<String, Value>) -> Vec<String> {
        let mut shadowed = Vec::new();
        for (key, value) in fields {
            if self.fields.insert(key.clone(), value).is_some() {
                shadowed.push(key);
            }
        }
        shadowed
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a field as display text, `None` when missing or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(display_value)
            .filter(|text| !text.trim().is_empty())
    }

    /// Returns `true` when `key` has been set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when no field has been set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Read-only view of every field.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}
