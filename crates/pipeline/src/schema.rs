//! Declarative pipeline definitions.
//!
//! A [`PipelineDefinition`] is static data: an ordered list of [`StageSpec`]s
//! (template, decode strategy, field schema with defaults), an advisory review
//! stage, and an output location. One generic executor runs any definition;
//! the built-in definitions are `const` items.
//!
//! ## Dependency contract
//!
//! A stage's template may reference the brief fields and any field declared by
//! an earlier stage, never a later one. [`PipelineDefinition::validate`] checks
//! this statically.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{
    context::SOURCE_TEXT_KEY,
    template::{display_value, placeholders},
    Artifact, ArtifactPath, DefinitionError, PipelineContext, PipelineName, ReviewFinding,
    ReviewVerdict, StageId, Timestamp,
};

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

/// One field a structured stage must populate, with the value used when the
/// stage's output cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefault {
    /// Field name.
    pub name: &'static str,
    /// Default value.
    pub default: &'static str,
}

impl FieldDefault {
    /// Declares a field and its default.
    pub const fn new(name: &'static str, default: &'static str) -> Self {
        Self { name, default }
    }
}

/// The ordered fields a structured stage must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSchema {
    fields: &'static [FieldDefault],
}

impl StageSchema {
    /// Creates a schema from its field declarations.
    pub const fn new(fields: &'static [FieldDefault]) -> Self {
        Self { fields }
    }

    /// Field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// The fallback mapping substituted when decoding fails.
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), Value::String(field.default.to_string())))
            .collect()
    }

    /// Default for a single field.
    pub fn default_for(&self, name: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.default)
    }
}

// ---------------------------------------------------------------------------
// Decode strategy
// ---------------------------------------------------------------------------

/// How the generation stage treats code fences in its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FencePolicy {
    /// Strip the first fence, preferring one tagged with `language`.
    Strip {
        /// Fence tag of the artifact's language (e.g. `"python"`).
        language: &'static str,
    },
    /// Keep the text as produced, trimmed. Used for prose, which may contain
    /// fenced examples of its own.
    Keep,
}

/// How a stage turns model text into context fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// Decode a JSON object, falling back to the schema defaults.
    Structured(StageSchema),
    /// Treat the text as the artifact and store it under `output_key`.
    Artifact {
        /// Context key receiving the artifact text.
        output_key: &'static str,
        /// Fence handling.
        fence: FencePolicy,
    },
}

// ---------------------------------------------------------------------------
// Operator highlights
// ---------------------------------------------------------------------------

/// A context field shown to the operator after a stage finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    /// Operator-facing label.
    pub label: &'static str,
    /// Context field to show.
    pub field: &'static str,
    /// Longer values are cut to this many characters and marked with `...`.
    pub max_chars: Option<usize>,
    /// Omit the line when the value is blank or `none`.
    pub skip_empty: bool,
}

impl Highlight {
    /// Shows `field` under `label`, untruncated.
    pub const fn new(label: &'static str, field: &'static str) -> Self {
        Self {
            label,
            field,
            max_chars: None,
            skip_empty: false,
        }
    }

    /// Truncates the value to `max_chars` characters.
    pub const fn truncate(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    /// Omits the line when the value is blank or `none`.
    pub const fn optional(mut self) -> Self {
        self.skip_empty = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// One prompt → generate → decode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// Stage identifier, unique within its pipeline.
    pub id: StageId,
    /// Operator-facing description of the step (e.g. `"Analysing the brief"`).
    pub title: &'static str,
    /// Prompt template; see [`crate::template`].
    pub template: &'static str,
    /// Decode strategy.
    pub decode: Decode,
    /// Fields shown to the operator after the stage.
    pub highlights: &'static [Highlight],
}

impl StageSpec {
    /// Fields this stage adds to the context.
    pub fn produced_fields(&self) -> Vec<&'static str> {
        match &self.decode {
            Decode::Structured(schema) => schema.field_names().collect(),
            Decode::Artifact { output_key, .. } => vec![*output_key],
        }
    }

    /// The structured schema, `None` for artifact stages.
    pub fn schema(&self) -> Option<&StageSchema> {
        match &self.decode {
            Decode::Structured(schema) => Some(schema),
            Decode::Artifact { .. } => None,
        }
    }

    /// Returns `true` for artifact-producing stages.
    pub fn is_artifact(&self) -> bool {
        matches!(self.decode, Decode::Artifact { .. })
    }
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// How the review stage's fields map onto a [`ReviewVerdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictSchema {
    /// Field holding the yes/no judgement.
    pub verdict_field: &'static str,
    /// Free-text issue fields, reported in this order.
    pub finding_fields: &'static [Highlight],
    /// Field holding recommendations.
    pub recommendations_field: &'static str,
}

/// Values of the verdict field that count as approval (case-insensitive).
const APPROVING_VERDICTS: &[&str] = &["yes", "y", "true", "valid", "ready"];

/// The advisory review stage and the interpretation of its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSpec {
    /// The review stage; must decode structured output.
    pub stage: StageSpec,
    /// Field mapping for the verdict.
    pub verdict: VerdictSchema,
}

impl ReviewSpec {
    /// Builds the verdict from the context after the review stage merged.
    ///
    /// Fields the reviewer omitted are read with the stage's schema defaults.
    /// Recommendations equal to the schema default ("nothing to add") are
    /// reported as `None`.
    pub fn verdict(&self, context: &PipelineContext, from_fallback: bool) -> ReviewVerdict {
        let schema = self.stage.schema();
        let read = |field: &str| -> String {
            context
                .text(field)
                .or_else(|| schema.and_then(|s| s.default_for(field)).map(str::to_string))
                .unwrap_or_default()
        };

        let verdict = read(self.verdict.verdict_field);
        let approved = APPROVING_VERDICTS
            .iter()
            .any(|accepted| verdict.trim().eq_ignore_ascii_case(accepted));

        let findings = self
            .verdict
            .finding_fields
            .iter()
            .map(|finding| ReviewFinding {
                field: finding.field.to_string(),
                label: finding.label.to_string(),
                message: read(finding.field),
            })
            .collect();

        let sentinel = schema.and_then(|s| s.default_for(self.verdict.recommendations_field));
        let recommendations = context
            .text(self.verdict.recommendations_field)
            .filter(|text| Some(text.trim()) != sentinel);

        ReviewVerdict {
            approved,
            verdict,
            findings,
            recommendations,
            from_fallback,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Width of the rule separating a file header from the artifact body.
pub const HEADER_RULE_WIDTH: usize = 80;

/// What precedes the artifact in the persisted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// The file contains only the artifact text.
    Bare,
    /// Origin line, generation timestamp, a rule, and a blank line.
    Banner {
        /// Label of the origin line (e.g. `"TOPIC"`).
        label: &'static str,
    },
}

/// Where and how a pipeline persists its artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    /// File name, relative to the output directory. Overwritten on every run.
    pub file: ArtifactPath,
    /// Header style.
    pub header: HeaderStyle,
}

impl OutputSpec {
    /// Renders the full file contents for `artifact`.
    pub fn render_document(&self, subject: &str, generated_at: Timestamp, artifact: &Artifact) -> String {
        match self.header {
            HeaderStyle::Bare => artifact.text().to_string(),
            HeaderStyle::Banner { label } => format!(
                "# {label}: {subject}\n# Generated: {}\n{}\n\n{}",
                generated_at.to_header_string(),
                "=".repeat(HEADER_RULE_WIDTH),
                artifact.text()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline definition
// ---------------------------------------------------------------------------

/// A complete pipeline: stages in dependency order, review, output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    /// Pipeline kind.
    pub name: PipelineName,
    /// Operator-facing banner title.
    pub title: &'static str,
    /// Context key the brief's subject is seeded under.
    pub brief_key: &'static str,
    /// Stages before review; the last one produces the artifact.
    pub stages: &'static [StageSpec],
    /// Advisory review stage.
    pub review: ReviewSpec,
    /// Persistence target.
    pub output: OutputSpec,
}

impl PipelineDefinition {
    /// The artifact-producing stage.
    pub fn artifact_stage(&self) -> Option<&StageSpec> {
        self.stages.last().filter(|stage| stage.is_artifact())
    }

    /// Context key holding the artifact text.
    pub fn artifact_key(&self) -> Option<&'static str> {
        match self.artifact_stage()?.decode {
            Decode::Artifact { output_key, .. } => Some(output_key),
            Decode::Structured(_) => None,
        }
    }

    /// Checks the linear-dependency contract.
    ///
    /// - stage identifiers are unique (review included);
    /// - exactly one artifact stage exists and it is the last pre-review stage;
    /// - the review stage decodes structured output;
    /// - every placeholder names a brief field or a field of an earlier stage.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for stage in self.stages.iter().chain(std::iter::once(&self.review.stage)) {
            if !seen.insert(stage.id.clone()) {
                return Err(DefinitionError::DuplicateStage {
                    stage: stage.id.clone(),
                });
            }
        }

        let artifact_stages = self.stages.iter().filter(|stage| stage.is_artifact()).count();
        if artifact_stages != 1 || self.artifact_stage().is_none() {
            return Err(DefinitionError::MisplacedArtifactStage {
                pipeline: self.name.clone(),
            });
        }
        if self.review.stage.is_artifact() {
            return Err(DefinitionError::UnstructuredReview {
                stage: self.review.stage.id.clone(),
            });
        }

        let mut available: HashSet<&str> = [self.brief_key, SOURCE_TEXT_KEY].into_iter().collect();
        for stage in self.stages.iter().chain(std::iter::once(&self.review.stage)) {
            for placeholder in placeholders(stage.template) {
                if !available.contains(placeholder.name) {
                    return Err(DefinitionError::UnknownField {
                        stage: stage.id.clone(),
                        field: placeholder.name.to_string(),
                    });
                }
            }
            available.extend(stage.produced_fields());
        }
        Ok(())
    }
}

/// Renders a context value for operator display, applying a highlight's
/// truncation. Returns `None` for blank values.
pub fn highlight_text(highlight: &Highlight, value: Option<&Value>) -> Option<String> {
    let text = value.map(display_value).filter(|text| !text.trim().is_empty())?;
    Some(match highlight.max_chars {
        Some(max) => truncate_chars(&text, max),
        None => text,
    })
}

/// Cuts `text` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
