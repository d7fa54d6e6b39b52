//! Core generation domain for Chainsmith.
//!
//! This crate contains every domain concept used by the multi-stage generation
//! pipeline: the brief and the context it seeds, declarative stage
//! definitions, prompt rendering, structured extraction with default
//! fallback, artifact unwrapping, and the port traits infrastructure crates
//! implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`StageId`, `PipelineRunId`, etc.) |
//! | [`types`] | Value types (`Artifact`, `ReviewVerdict`, `TokenUsage`, etc.) |
//! | [`errors`] | Error types |
//! | [`context`] | `Brief` and `PipelineContext` |
//! | [`schema`] | `PipelineDefinition`, `StageSpec`, `StageSchema` |
//! | [`template`] | Placeholder rendering |
//! | [`extract`] | Structured extractor and `StageOutcome` |
//! | [`unwrap`] | Code-fence unwrapping |
//! | [`ports`] | `LlmProvider`, `ArtifactStore`, `Clock`, `RunObserver` |

pub mod context;
pub mod errors;
pub mod extract;
pub mod identifiers;
pub mod ports;
pub mod schema;
pub mod template;
pub mod types;
pub mod unwrap;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use context::{Brief, PipelineContext, SOURCE_TEXT_KEY};
pub use errors::{CatalogError, DefinitionError, LlmError, PersistError, PipelineError};
pub use extract::{extract, StageOutcome};
pub use identifiers::{ArtifactPath, PipelineName, PipelineRunId, PromptId, StageId};
pub use ports::{
    ArtifactStore, Clock, Completion, CompletionRequest, LlmProvider, Message, NoopObserver, Role,
    RunObserver, StagePosition, SystemClock,
};
pub use schema::{
    highlight_text, Decode, FencePolicy, FieldDefault, HeaderStyle, Highlight, OutputSpec,
    PipelineDefinition, ReviewSpec, StageSchema, StageSpec, VerdictSchema, HEADER_RULE_WIDTH,
};
pub use schema::truncate_chars;
pub use template::{display_value, render};
pub use types::{Artifact, ReviewFinding, ReviewVerdict, Timestamp, TokenCount, TokenUsage};
pub use unwrap::{fence, unwrap_artifact, FENCE};
