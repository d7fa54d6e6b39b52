//! Chainsmith stage execution and pipeline orchestration.
//!
//! This crate runs [`pipeline::PipelineDefinition`]s: it executes each stage
//! against an [`pipeline::LlmProvider`], merges the decoded fields into the
//! running context, derives the advisory review verdict, and persists the
//! artifact through an [`pipeline::ArtifactStore`]. It also ships the built-in
//! pipeline catalogue and the JSON prompt library.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The executor sequences calls between the domain
//! logic in the [`pipeline`] crate and the injected ports. It contains no
//! provider or console code of its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`stage`] | `run_stage`: render → generate → decode |
//! | [`executor`] | `PipelineExecutor` and `RunReport` |
//! | [`store`] | `FileArtifactStore` |
//! | [`catalog`] | `BOT_PIPELINE`, `POST_PIPELINE` |
//! | [`prompts`] | `PromptLibrary` and `ask` |

pub mod catalog;
pub mod executor;
pub mod prompts;
pub mod stage;
pub mod store;

pub use catalog::{BOT_PIPELINE, POST_PIPELINE};
pub use executor::{Persistence, PipelineExecutor, RunReport, StageRecord};
pub use prompts::{
    ask, sanitize_temperature, LoadedPrompt, PromptDefinition, PromptLibrary, SkippedFile,
    DEFAULT_MAX_TOKENS, DEFAULT_PROMPT_TEMPERATURE,
};
pub use stage::{run_stage, PIPELINE_TEMPERATURE};
pub use store::FileArtifactStore;
