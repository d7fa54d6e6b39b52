//! Port traits implemented by infrastructure crates.
//!
//! The executor in `nodes` is handed these as `Arc<dyn ...>` values; nothing
//! in the domain constructs a provider, touches the file system, or reads the
//! clock on its own. Tests substitute deterministic stubs.
//!
//! | Port | Production implementation |
//! |------|---------------------------|
//! | [`LlmProvider`] | `llm::OpenAiProvider` |
//! | [`ArtifactStore`] | `nodes::FileArtifactStore` |
//! | [`Clock`] | [`SystemClock`] |
//! | [`RunObserver`] | the CLI console reporter |

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Artifact, ArtifactPath, Brief, LlmError, PersistError, PipelineContext, PipelineDefinition,
    ReviewSpec, ReviewVerdict, StageSpec, Timestamp, TokenUsage,
};

// ---------------------------------------------------------------------------
// Model gateway
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation.
    System,
    /// The operator's (or pipeline's) request.
    User,
    /// A previous model reply.
    Assistant,
}

/// One message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Text.
    pub content: String,
}

impl Message {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A fully-rendered request to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation to complete.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion length cap; `None` leaves it to the provider.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// A single-turn request carrying `prompt` as the user message.
    pub fn from_prompt(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            temperature,
            max_tokens: None,
        }
    }

    /// Text of the last user message; what a pipeline stage rendered.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }
}

/// The model's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Raw generated text.
    pub text: String,
    /// Model that produced the text, as reported by the provider.
    pub model: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<TokenUsage>,
    /// Provider finish reason (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// The generative model: `generate(prompt) -> text`, fallible.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends `request` and returns the completion.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;

    /// The configured model identifier.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Destination of finished artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replaces the contents of `path` with `contents`. Returns the location
    /// written.
    async fn persist(&self, path: &ArtifactPath, contents: &str) -> Result<PathBuf, PersistError>;
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Source of the generation timestamp written into file headers.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ---------------------------------------------------------------------------
// Operator reporting
// ---------------------------------------------------------------------------

/// Position of a stage in its run, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePosition {
    /// 1-based index among the pre-review stages; `total + 1` for review.
    pub index: usize,
    /// Number of pre-review stages.
    pub total: usize,
    /// `true` for the advisory review stage.
    pub is_review: bool,
}

/// Receives progress notifications from a run.
///
/// Every method has an empty default so reporters implement only what they
/// display.
pub trait RunObserver: Send + Sync {
    /// The run is about to start.
    fn run_started(&self, _definition: &PipelineDefinition, _brief: &Brief) {}

    /// A stage is about to call the model.
    fn stage_started(&self, _stage: &StageSpec, _position: StagePosition) {}

    /// A stage's fields were merged into `context`. `fallback_cause` is set
    /// when the stage's defaults were substituted.
    fn stage_finished(
        &self,
        _stage: &StageSpec,
        _position: StagePosition,
        _fallback_cause: Option<&str>,
        _context: &PipelineContext,
    ) {
    }

    /// The generation stage produced the artifact.
    fn artifact_ready(&self, _artifact: &Artifact) {}

    /// The review stage finished; `review` describes how `verdict` was read.
    fn review_ready(&self, _review: &ReviewSpec, _verdict: &ReviewVerdict) {}
}

/// A [`RunObserver`] that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
