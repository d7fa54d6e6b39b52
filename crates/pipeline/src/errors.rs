//! Error types for the generation domain.
//!
//! [`PipelineError`] covers conditions that halt a pipeline run. Component-level
//! errors ([`LlmError`] for the model gateway, [`PersistError`] for artifact
//! storage) are carried inside it or, for persistence, recorded in the run
//! report without halting anything.
//!
//! Structured-decode failures have no error type here: they are absorbed by
//! [`crate::extract`] and surface only as
//! [`crate::StageOutcome::Fallback`].

use std::path::PathBuf;

use thiserror::Error;

use crate::{PipelineName, PromptId, StageId};

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

/// Failure of the generative model gateway.
///
/// Every variant is fatal to the current pipeline run. No stage retries a
/// gateway call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, reset).
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The provider rejected the credentials.
    #[error("Authentication rejected by provider (status {status})")]
    Authentication {
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// The provider refused the call because a rate or quota limit was hit.
    #[error("Rate limit or quota exceeded: {message}")]
    RateLimited {
        /// Provider-supplied description.
        message: String,
    },

    /// The provider returned a non-success status not covered above.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The provider answered with a body that could not be decoded.
    #[error("Malformed provider response: {message}")]
    MalformedResponse {
        /// Description of the decoding problem.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

/// Failure to write an artifact document.
///
/// Never fatal to a run: the orchestrator records it and still returns the
/// artifact.
#[derive(Debug, Error)]
#[error("Failed to write {path}: {source}")]
pub struct PersistError {
    /// Location that could not be written.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

// ---------------------------------------------------------------------------
// Definition errors
// ---------------------------------------------------------------------------

/// A pipeline definition violates the linear-dependency contract.
///
/// Produced by [`crate::PipelineDefinition::validate`]; built-in definitions
/// are checked by their unit tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A template references a field no earlier stage (or the brief) provides.
    #[error("Stage '{stage}' references unknown field '{field}'")]
    UnknownField {
        /// Stage whose template holds the placeholder.
        stage: StageId,
        /// The unresolvable field name.
        field: String,
    },

    /// Two stages share an identifier.
    #[error("Stage identifier '{stage}' is used more than once")]
    DuplicateStage {
        /// The repeated identifier.
        stage: StageId,
    },

    /// The terminal stage before review does not produce an artifact, or an
    /// artifact stage appears elsewhere.
    #[error("Pipeline '{pipeline}' must end with exactly one artifact stage")]
    MisplacedArtifactStage {
        /// The offending pipeline.
        pipeline: PipelineName,
    },

    /// The review stage does not decode structured output.
    #[error("Review stage '{stage}' must decode structured output")]
    UnstructuredReview {
        /// The review stage.
        stage: StageId,
    },
}

// ---------------------------------------------------------------------------
// Prompt library errors
// ---------------------------------------------------------------------------

/// Failure to load or select from the prompt library.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The library directory does not exist or cannot be listed.
    #[error("Prompt directory {path} is not readable: {source}")]
    DirectoryUnreadable {
        /// Directory that was scanned.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No prompt definition could be loaded.
    #[error("No prompt definitions found in {path}")]
    Empty {
        /// Directory that was scanned.
        path: PathBuf,
    },

    /// The selector matched neither an index nor a `prompt_id`.
    #[error("No prompt matches '{selector}'")]
    UnknownPrompt {
        /// The selector as given.
        selector: String,
    },

    /// `--use-test-input` was given for a prompt without a test input.
    #[error("Prompt '{prompt}' has no test input")]
    MissingTestInput {
        /// The selected prompt.
        prompt: PromptId,
    },
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that halt a pipeline run.
///
/// A halted run never persists anything.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage's gateway call failed.
    #[error("Stage '{stage}' failed: {source}")]
    Gateway {
        /// Stage whose call failed.
        stage: StageId,
        /// The gateway failure.
        #[source]
        source: LlmError,
    },

    /// A required input was missing before any stage ran.
    #[error("Missing required input: {message}")]
    Precondition {
        /// Description of what is missing.
        message: String,
    },

    /// The runtime configuration is invalid (missing credential, bad endpoint).
    ///
    /// Produced at start-up; no stage runs with an invalid configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl PipelineError {
    /// Returns `true` when the error was detected before any stage ran.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. } | Self::Configuration { .. })
    }
}
