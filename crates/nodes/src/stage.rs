//! Execution of a single stage.
//!
//! A stage renders its template against the context, makes exactly one
//! gateway call, and decodes the reply according to its [`Decode`] strategy.
//! Gateway failures propagate; decode failures never do.

use pipeline::{
    extract, render, unwrap_artifact, CompletionRequest, Decode, FencePolicy, LlmProvider,
    PipelineContext, PipelineError, StageOutcome, StageSpec,
};
use serde_json::{Map, Value};

/// Sampling temperature used for every pipeline stage.
pub const PIPELINE_TEMPERATURE: f32 = 0.7;

/// Runs `spec` against `context` and returns the fields to merge.
///
/// # Errors
///
/// Returns [`PipelineError::Gateway`] when the provider call fails. The call is
/// not retried.
#[tracing::instrument(skip_all, fields(stage = %spec.id))]
pub async fn run_stage(
    provider: &dyn LlmProvider,
    spec: &StageSpec,
    context: &PipelineContext,
) -> Result<StageOutcome, PipelineError> {
    let prompt = render(spec.template, context);
    tracing::debug!(prompt_chars = prompt.chars().count(), "rendered stage prompt");

    let completion = provider
        .complete(CompletionRequest::from_prompt(prompt, PIPELINE_TEMPERATURE))
        .await
        .map_err(|source| PipelineError::Gateway {
            stage: spec.id.clone(),
            source,
        })?;

    if let Some(usage) = completion.usage {
        tracing::debug!(
            prompt_tokens = usage.prompt.as_u64(),
            completion_tokens = usage.completion.as_u64(),
            "stage completion received"
        );
    }

    Ok(decode(spec, &completion.text))
}

/// Decodes raw model text according to the stage's strategy.
pub fn decode(spec: &StageSpec, raw: &str) -> StageOutcome {
    match spec.decode {
        Decode::Structured(schema) => extract(raw, &schema.defaults()),
        Decode::Artifact { output_key, fence } => {
            let text = match fence {
                FencePolicy::Strip { language } => unwrap_artifact(raw, Some(language)),
                FencePolicy::Keep => raw.trim().to_string(),
            };
            let mut fields = Map::new();
            fields.insert(output_key.to_string(), Value::String(text));
            StageOutcome::Structured { fields }
        }
    }
}
