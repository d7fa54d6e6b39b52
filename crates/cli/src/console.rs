//! Operator-facing report printed to stdout.

use nodes::{LoadedPrompt, Persistence, PromptLibrary, RunReport};
use pipeline::{
    highlight_text, truncate_chars, Artifact, Brief, Completion, Highlight, PipelineContext,
    PipelineDefinition, ReviewSpec, ReviewVerdict, RunObserver, StagePosition, StageSpec,
};
use serde_json::Value;

const RULE_WIDTH: usize = 80;
const PREVIEW_CHARS: usize = 100;

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

fn banner(title: &str) {
    println!("\n{}", rule('='));
    println!("{title}");
    println!("{}", rule('='));
}

/// Formats one highlight line; `None` when an optional value is absent.
fn highlight_line(highlight: &Highlight, value: Option<&Value>) -> Option<String> {
    match highlight_text(highlight, value) {
        Some(text) if highlight.skip_empty && text.trim().eq_ignore_ascii_case("none") => None,
        Some(text) => Some(format!("   - {}: {text}", highlight.label)),
        None if highlight.skip_empty => None,
        None => Some(format!("   - {}: N/A", highlight.label)),
    }
}

// ---------------------------------------------------------------------------
// Pipeline progress
// ---------------------------------------------------------------------------

/// Prints stage progress and highlights as a run advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn run_started(&self, definition: &PipelineDefinition, _brief: &Brief) {
        banner(definition.title);
    }

    fn stage_started(&self, stage: &StageSpec, position: StagePosition) {
        if position.is_review {
            println!("\nFINAL CHECK: {}...", stage.title);
        } else {
            println!("\nSTEP {}/{}: {}...", position.index, position.total, stage.title);
        }
    }

    fn stage_finished(
        &self,
        stage: &StageSpec,
        _position: StagePosition,
        fallback_cause: Option<&str>,
        context: &PipelineContext,
    ) {
        match fallback_cause {
            Some(_) => println!("Done (response not parsed, defaults used)"),
            None => println!("Done"),
        }
        for highlight in stage.highlights {
            if let Some(line) = highlight_line(highlight, context.get(highlight.field)) {
                println!("{line}");
            }
        }
    }

    fn artifact_ready(&self, artifact: &Artifact) {
        println!("   - Size: {} characters", artifact.char_count());
        println!("   - Lines: {}", artifact.line_count());
    }

    fn review_ready(&self, review: &ReviewSpec, verdict: &ReviewVerdict) {
        for line in review_lines(review, verdict) {
            println!("{line}");
        }
    }
}

fn review_lines(review: &ReviewSpec, verdict: &ReviewVerdict) -> Vec<String> {
    let mut lines = vec![format!("   - Verdict: {}", verdict.verdict)];
    let fields = review.verdict.finding_fields;
    for (finding, highlight) in verdict.findings.iter().zip(fields) {
        let value = Value::String(finding.message.clone());
        lines.extend(highlight_line(highlight, Some(&value)));
    }
    if let Some(recommendations) = &verdict.recommendations {
        lines.push(String::new());
        lines.push(format!("Recommendations: {recommendations}"));
    }
    lines
}

// ---------------------------------------------------------------------------
// Run summaries
// ---------------------------------------------------------------------------

fn print_persistence(report: &RunReport, label: &str) -> bool {
    match &report.persistence {
        Persistence::Saved(path) => {
            banner(&format!("{label} GENERATED: {}", path.display()));
            true
        }
        Persistence::Failed { path, reason } => {
            println!("\nFailed to save {}: {reason}", path.display());
            false
        }
    }
}

/// Installation and launch hints for a generated bot.
pub fn bot_next_steps(context: &PipelineContext, file: &str) -> Vec<String> {
    let extra = context
        .text("additional_libraries")
        .filter(|libs| !libs.trim().eq_ignore_ascii_case("none"));

    let mut steps = vec!["Install dependencies: pip install aiogram python-dotenv".to_string()];
    if let Some(libs) = extra {
        steps.push(format!("Install extra libraries: pip install {libs}"));
    }
    steps.push("Add BOT_TOKEN to your .env file".to_string());
    steps.push(format!("Run: python {file}"));

    steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| format!("   {}. {step}", i + 1))
        .collect()
}

/// Final report for a bot run.
pub fn print_bot_summary(report: &RunReport, print_source: bool) {
    if print_persistence(report, "BOT") {
        if let Persistence::Saved(path) = &report.persistence {
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            println!("\nTo run the bot:");
            for line in bot_next_steps(&report.context, &file) {
                println!("{line}");
            }
        }
    }
    if print_source {
        println!("\n{}", rule('-'));
        println!("{}", report.artifact.text());
        println!("{}", rule('-'));
    }
    println!();
}

/// Final report for a post run: the post body is always shown.
pub fn print_post_summary(report: &RunReport) {
    print_persistence(report, "POST");
    println!("\nPOST CONTENT:");
    println!("{}", rule('-'));
    println!("{}", report.artifact.text());
    println!("{}", rule('-'));
    println!();
}

// ---------------------------------------------------------------------------
// Prompt library
// ---------------------------------------------------------------------------

pub fn print_skipped(library: &PromptLibrary) {
    for skipped in library.skipped() {
        eprintln!("warning: skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}

/// Numbered listing of the library.
pub fn prompt_listing(library: &PromptLibrary) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, prompt) in library.prompts().iter().enumerate() {
        let definition = &prompt.definition;
        let or_na = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());
        lines.push(format!("{}. {}", index + 1, definition.display_name()));
        lines.push(format!("   ID: {}", prompt.id));
        lines.push(format!("   Category: {}", or_na(&definition.category)));
        lines.push(format!("   Description: {}", or_na(&definition.description)));
        lines.push(format!("   Role: {}", truncate_chars(&or_na(&definition.role), PREVIEW_CHARS)));
        lines.push(format!("   Context: {}", truncate_chars(&or_na(&definition.context), PREVIEW_CHARS)));
        if definition.test_input.is_some() {
            lines.push("   Has a test input".to_string());
        }
        lines.push(String::new());
    }
    lines
}

pub fn print_prompt_list(library: &PromptLibrary) {
    banner(&format!("Available prompts ({})", library.dir().display()));
    for line in prompt_listing(library) {
        println!("{line}");
    }
}

pub fn print_request_info(prompt: &LoadedPrompt, model: &str, temperature: f32, max_tokens: u32) {
    banner(&format!("Prompt: {}", prompt.definition.display_name()));
    println!("   - Model: {model}");
    println!("   - Temperature: {temperature}");
    println!("   - Max tokens: {max_tokens}");
}

pub fn print_answer(prompt: &LoadedPrompt, completion: &Completion) {
    banner(&format!("Answer - {}", prompt.definition.display_name()));
    println!();
    println!("{}", completion.text);
    println!();
    println!("{}", rule('='));
    println!("   - Model: {}", completion.model);
    if let Some(usage) = completion.usage {
        println!("   - Tokens used: {}", usage.total);
        println!("   - Prompt tokens: {}", usage.prompt);
        println!("   - Completion tokens: {}", usage.completion);
    }
    println!("{}", rule('='));
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodes::BOT_PIPELINE;
    use pipeline::ReviewFinding;
    use serde_json::json;

    fn context(value: Value) -> PipelineContext {
        let mut context = PipelineContext::default();
        if let Value::Object(map) = value {
            context.merge(map);
        }
        context
    }

    #[test]
    fn long_values_are_truncated_with_ellipsis() {
        let highlight = Highlight::new("Key features", "key_features").truncate(10);
        let line = highlight_line(&highlight, Some(&json!("abcdefghijklmnop"))).unwrap();
        assert_eq!(line, "   - Key features: abcdefghij...");
    }

    #[test]
    fn missing_values_show_na_unless_optional() {
        let required = Highlight::new("Commands", "commands");
        assert_eq!(highlight_line(&required, None).unwrap(), "   - Commands: N/A");

        let optional = Highlight::new("Keyboards", "keyboards").optional();
        assert_eq!(highlight_line(&optional, Some(&json!(""))), None);
        assert_eq!(highlight_line(&optional, Some(&json!("none"))), None);
    }

    #[test]
    fn extra_libraries_add_an_install_step() {
        let steps = bot_next_steps(
            &context(json!({"additional_libraries": "requests pillow"})),
            "generated_bot.py",
        );
        assert_eq!(
            steps,
            [
                "   1. Install dependencies: pip install aiogram python-dotenv",
                "   2. Install extra libraries: pip install requests pillow",
                "   3. Add BOT_TOKEN to your .env file",
                "   4. Run: python generated_bot.py",
            ]
        );

        let steps = bot_next_steps(&context(json!({"additional_libraries": "none"})), "bot.py");
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2], "   3. Run: python bot.py");
    }

    #[test]
    fn review_lines_list_findings_and_recommendations() {
        let verdict = ReviewVerdict {
            approved: false,
            verdict: "no".to_string(),
            findings: vec![ReviewFinding {
                field: "syntax_errors".to_string(),
                label: "Syntax errors".to_string(),
                message: "missing colon".to_string(),
            }],
            recommendations: Some("Add a colon".to_string()),
            from_fallback: false,
        };
        let lines = review_lines(&BOT_PIPELINE.review, &verdict);
        assert_eq!(
            lines,
            [
                "   - Verdict: no",
                "   - Syntax errors: missing colon",
                "",
                "Recommendations: Add a colon",
            ]
        );
    }
}
