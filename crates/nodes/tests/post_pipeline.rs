mod common;

use std::sync::{Arc, Mutex};

use common::{FixedClock, MemoryStore, ScriptedProvider};
use nodes::{PipelineExecutor, POST_PIPELINE};
use pipeline::{
    Artifact, Brief, PipelineContext, PipelineDefinition, ReviewSpec, ReviewVerdict, RunObserver,
    StagePosition, StageSpec,
};
use serde_json::json;

const POST_BODY: &str = "**AI in medicine**\n\nDiagnostics are getting faster.\n\n#health";

fn script(review: String) -> Vec<String> {
    vec![
        json!({"post_goal": "Educate", "target_audience": "Doctors", "key_messages": "speed",
               "tone_style": "Professional", "desired_length": "short"})
        .to_string(),
        json!({"structure": "Headline, body", "use_emoji": "no", "emoji_style": "",
               "cta": "Subscribe", "hashtags": "#health", "formatting": "bold"})
        .to_string(),
        json!({"headline": "AI in medicine", "intro": "Hook", "main_blocks": "Speed",
               "conclusion": "Wrap up", "cta_text": ""})
        .to_string(),
        format!("\n{POST_BODY}\n\n"),
        review,
    ]
}

fn approving_review() -> String {
    json!({"is_ready": "yes", "completeness": "complete", "structure_quality": "good",
           "engagement": "high", "recommendations": "The post is ready to publish"})
    .to_string()
}

fn executor(provider: &Arc<ScriptedProvider>, store: &Arc<MemoryStore>) -> PipelineExecutor {
    PipelineExecutor::new(provider.clone(), store.clone()).with_clock(Arc::new(FixedClock::at_noon()))
}

#[tokio::test]
async fn post_file_has_topic_header_rule_and_body() {
    let provider = Arc::new(ScriptedProvider::replying(script(approving_review())));
    let store = Arc::new(MemoryStore::default());
    let brief = Brief::new("AI in medicine").unwrap();

    let report = executor(&provider, &store).run(&POST_PIPELINE, &brief).await.unwrap();

    let expected = format!(
        "# TOPIC: AI in medicine\n# Generated: 2024-05-01 12:00:00 UTC\n{}\n\n{POST_BODY}",
        "=".repeat(80)
    );
    assert_eq!(store.get("generated_post.txt"), Some(expected));
    assert_eq!(report.artifact.text(), POST_BODY);
    assert!(report.review.approved);
    assert_eq!(report.review.recommendations, None);
}

#[tokio::test]
async fn source_text_is_optional() {
    let provider = Arc::new(ScriptedProvider::replying(script(approving_review())));
    let store = Arc::new(MemoryStore::default());

    executor(&provider, &store)
        .run(&POST_PIPELINE, &Brief::new("AI in medicine").unwrap())
        .await
        .unwrap();
    let without = provider.prompts();
    assert!(without[0].contains("Source material: Not provided\n"));
    assert!(without[3].contains("Source material: Not provided\n"));

    let provider = Arc::new(ScriptedProvider::replying(script(approving_review())));
    let brief = Brief::new("AI in medicine")
        .unwrap()
        .with_source_text("A trial with 2,000 patients.");
    executor(&provider, &store).run(&POST_PIPELINE, &brief).await.unwrap();
    assert!(provider.prompts()[0].contains("Source material: A trial with 2,000 patients.\n"));
}

#[tokio::test]
async fn unreadable_review_falls_back_to_an_approving_verdict() {
    let provider = Arc::new(ScriptedProvider::replying(script("Looks fine to me!".to_string())));
    let store = Arc::new(MemoryStore::default());

    let report = executor(&provider, &store)
        .run(&POST_PIPELINE, &Brief::new("AI in medicine").unwrap())
        .await
        .unwrap();

    assert!(report.review.from_fallback);
    assert!(report.review.approved);
    assert_eq!(report.review.findings[0].message, "Good structure");
    assert_eq!(report.review.recommendations, None);
    assert!(store.get("generated_post.txt").is_some());
}

#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl RunObserver for Recorder {
    fn run_started(&self, definition: &PipelineDefinition, _brief: &Brief) {
        self.0.lock().unwrap().push(format!("start {}", definition.name));
    }

    fn stage_started(&self, stage: &StageSpec, position: StagePosition) {
        self.0
            .lock()
            .unwrap()
            .push(format!("{}/{} {}", position.index, position.total, stage.id));
    }

    fn stage_finished(
        &self,
        stage: &StageSpec,
        _position: StagePosition,
        fallback_cause: Option<&str>,
        _context: &PipelineContext,
    ) {
        let tag = if fallback_cause.is_some() { "fallback" } else { "ok" };
        self.0.lock().unwrap().push(format!("{} {tag}", stage.id));
    }

    fn artifact_ready(&self, artifact: &Artifact) {
        self.0
            .lock()
            .unwrap()
            .push(format!("artifact {}", artifact.line_count()));
    }

    fn review_ready(&self, review: &ReviewSpec, verdict: &ReviewVerdict) {
        self.0
            .lock()
            .unwrap()
            .push(format!("review {} {}", review.verdict.verdict_field, verdict.approved));
    }
}

#[tokio::test]
async fn observer_sees_stages_in_order() {
    let mut replies = script(approving_review());
    replies[1] = "no json".to_string();
    let provider = Arc::new(ScriptedProvider::replying(replies));
    let store = Arc::new(MemoryStore::default());
    let recorder = Arc::new(Recorder::default());

    executor(&provider, &store)
        .with_observer(recorder.clone())
        .run(&POST_PIPELINE, &Brief::new("AI in medicine").unwrap())
        .await
        .unwrap();

    let events = recorder.0.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "start post",
            "1/4 analysis",
            "analysis ok",
            "2/4 style_selection",
            "style_selection fallback",
            "3/4 structure",
            "structure ok",
            "4/4 content",
            "content ok",
            "artifact 5",
            "5/4 review",
            "review ok",
            "review is_ready true",
        ]
    );
}
