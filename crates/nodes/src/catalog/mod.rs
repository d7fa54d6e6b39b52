//! Built-in pipeline definitions.
//!
//! | Pipeline | Brief | Artifact | File |
//! |----------|-------|----------|------|
//! | [`BOT_PIPELINE`] | bot description | aiogram 3.x Python source | `generated_bot.py` |
//! | [`POST_PIPELINE`] | post topic (+ source text) | publishable post | `generated_post.txt` |
//!
//! Both share the same shape: analysis → selection → structure → generation,
//! followed by an advisory review.

mod bot;
mod post;

pub use bot::BOT_PIPELINE;
pub use post::POST_PIPELINE;

use pipeline::PipelineDefinition;

/// Every built-in pipeline.
pub fn all() -> [&'static PipelineDefinition; 2] {
    [&BOT_PIPELINE, &POST_PIPELINE]
}

/// Looks up a built-in pipeline by name (`"bot"` or `"post"`).
pub fn by_name(name: &str) -> Option<&'static PipelineDefinition> {
    all()
        .into_iter()
        .find(|definition| definition.name.as_str() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{render, Decode, PipelineContext};

    #[test]
    fn every_builtin_pipeline_validates() {
        for definition in all() {
            assert_eq!(definition.validate(), Ok(()), "{}", definition.name);
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("bot").map(|d| d.output.file.as_str()), Some("generated_bot.py"));
        assert_eq!(by_name("post").map(|d| d.output.file.as_str()), Some("generated_post.txt"));
        assert!(by_name("tweet").is_none());
    }

    #[test]
    fn builtin_pipelines_have_four_stages_and_a_review() {
        for definition in all() {
            assert_eq!(definition.stages.len(), 4, "{}", definition.name);
            assert!(matches!(definition.review.stage.decode, Decode::Structured(_)));
        }
    }

    #[test]
    fn structured_templates_request_every_schema_field() {
        for definition in all() {
            for stage in definition.stages.iter().chain([&definition.review.stage]) {
                let Some(schema) = stage.schema() else { continue };
                let prompt = render(stage.template, &PipelineContext::default());
                for field in schema.field_names() {
                    assert!(
                        prompt.contains(&format!("\"{field}\":")),
                        "stage '{}' does not ask for '{field}'",
                        stage.id
                    );
                }
            }
        }
    }
}
