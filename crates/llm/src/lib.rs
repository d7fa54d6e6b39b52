//! Chainsmith LLM provider infrastructure adapter.
//!
//! Implements the [`pipeline::LlmProvider`] trait for OpenAI-compatible Chat
//! Completions endpoints (the public OpenAI API or any proxy exposing the same
//! protocol). Additional providers are added as new `impl` blocks in this
//! crate without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, request formatting, response
//! parsing and status classification live here. The [`pipeline`] crate sees
//! only [`pipeline::LlmProvider`].

mod config;
mod openai;
mod wire;

pub use config::{LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
pub use openai::OpenAiProvider;
