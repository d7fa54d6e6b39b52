//! OpenAI Chat Completions provider.

use async_trait::async_trait;
use pipeline::{Completion, CompletionRequest, LlmError, LlmProvider, PipelineError};
use reqwest::Client;

use crate::{
    config::LlmConfig,
    wire::{classify_status, parse_response, ChatRequest},
};

/// [`LlmProvider`] backed by an OpenAI-compatible `/chat/completions` endpoint.
///
/// Each call is a single HTTP request; failures are returned, never retried.
pub struct OpenAiProvider {
    config: LlmConfig,
    endpoint: String,
    client: Client,
}

impl OpenAiProvider {
    /// Validates `config` and builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when the configuration is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PipelineError::Configuration {
                message: format!("failed to build HTTP client: {err}"),
            })?;

        if config.uses_custom_endpoint() {
            tracing::debug!(base_url = %config.base_url, "using alternate API endpoint");
        }
        tracing::debug!(model = %config.model, "created LLM client");

        Ok(Self {
            endpoint: format!("{}/chat/completions", config.base_url),
            config,
            client,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    #[tracing::instrument(
        skip_all,
        fields(model = %self.config.model, messages = request.messages.len())
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = ChatRequest::new(&self.config.model, &request);
        let transport = |err: reqwest::Error| LlmError::Transport {
            message: err.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "provider returned an error status");
            return Err(classify_status(status.as_u16(), text));
        }

        let completion = parse_response(&text, &self.config.model)?;
        if let Some(usage) = completion.usage {
            tracing::debug!(total_tokens = usage.total.as_u64(), "completion received");
        }
        Ok(completion)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
