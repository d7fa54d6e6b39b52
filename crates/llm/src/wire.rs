//! Chat Completions request and response bodies.

use pipeline::{Completion, CompletionRequest, LlmError, Message, Role, TokenCount, TokenUsage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub(crate) fn new(model: &'a str, request: &'a CompletionRequest) -> Self {
        Self {
            model,
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

impl<'a> From<&'a Message> for ChatMessage<'a> {
    fn from(message: &'a Message) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role,
            content: &message.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Decodes a successful response body.
pub(crate) fn parse_response(body: &str, requested_model: &str) -> Result<Completion, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|err| LlmError::MalformedResponse {
            message: format!("invalid JSON body: {err}"),
        })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::MalformedResponse {
            message: "response has no choices".to_string(),
        })?;

    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        model: response.model.unwrap_or_else(|| requested_model.to_string()),
        usage: response.usage.map(|usage| TokenUsage {
            prompt: TokenCount::new(usage.prompt_tokens),
            completion: TokenCount::new(usage.completion_tokens),
            total: TokenCount::new(usage.total_tokens),
        }),
        finish_reason: choice.finish_reason,
    })
}

/// Maps a non-success status to the gateway error taxonomy.
pub(crate) fn classify_status(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Authentication { status },
        429 => LlmError::RateLimited {
            message: error_message(&body).unwrap_or(body),
        },
        _ => LlmError::Api { status, body },
    }
}

// OpenAI-style error envelope: {"error": {"message": "..."}}
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
