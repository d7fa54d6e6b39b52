//! Provider configuration.

use std::time::Duration;

use pipeline::PipelineError;

/// Public OpenAI endpoint, used when no alternate base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for an OpenAI-compatible Chat Completions endpoint.
#[derive(Clone)]
pub struct LlmConfig {
    /// Bearer token.
    pub api_key: String,
    /// API root, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Configuration for the public endpoint with the default timeout.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Points the client at an alternate endpoint. Blank values are ignored.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url.map(str::trim).filter(|url| !url.is_empty()) {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the configuration before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] for a blank API key or model,
    /// a zero timeout, or a base URL that is not `http(s)://`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "OPENAI_API_KEY is not set".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "model name is empty".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(PipelineError::Configuration {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(PipelineError::Configuration {
                message: format!("base URL '{}' is not an http(s) URL", self.base_url),
            });
        }
        Ok(())
    }

    /// Whether requests go to an endpoint other than the public one.
    pub fn uses_custom_endpoint(&self) -> bool {
        self.base_url != DEFAULT_BASE_URL
    }
}

// The key never appears in logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
