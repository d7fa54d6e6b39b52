//! Chainsmith CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `.env`, then read flags with environment
//!    fallbacks (`OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`,
//!    `OPENAI_TIMEOUT_SECS`, `LOG_LEVEL`).
//! 2. **Wire observability**: configure `tracing-subscriber` and, when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: create the `OpenAiProvider` and the
//!    `FileArtifactStore` and inject them into `PipelineExecutor`.
//! 4. **Select the mode**:
//!    - `bot`: run the bot pipeline for a description.
//!    - `post`: run the post pipeline for a topic and optional source text.
//!    - `prompt`: list or query the JSON prompt library.
//!
//! Exit status: `0` on success (including a failed save), `1` when a
//! precondition or the model gateway fails, `130` on Ctrl-C.

mod console;
mod telemetry;

use std::{
    io::Read,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use llm::{LlmConfig, OpenAiProvider, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use nodes::{
    ask, FileArtifactStore, PipelineExecutor, PromptLibrary, RunReport, BOT_PIPELINE,
    DEFAULT_MAX_TOKENS, DEFAULT_PROMPT_TEMPERATURE, POST_PIPELINE,
};
use pipeline::{Brief, LlmProvider, PipelineDefinition, PipelineError};
use tokio::sync::oneshot;

use crate::console::ConsoleObserver;

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

/// Multi-stage LLM generation of Telegram bots and text posts.
#[derive(Parser, Debug)]
#[command(name = "chainsmith", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    gateway: GatewayArgs,

    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory generated files are written to
    #[arg(long, default_value = ".", global = true)]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GatewayArgs {
    /// API key for the model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// Alternate OpenAI-compatible endpoint (e.g. a proxy)
    #[arg(long, env = "OPENAI_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "OPENAI_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs(), global = true)]
    timeout_secs: u64,
}

impl GatewayArgs {
    fn provider(&self) -> Result<Arc<OpenAiProvider>, PipelineError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PipelineError::Configuration {
                message: "OPENAI_API_KEY is not set (environment or .env file)".to_string(),
            })?;
        let config = LlmConfig::new(api_key, &self.model)
            .with_base_url(self.base_url.as_deref())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        Ok(Arc::new(OpenAiProvider::new(config)?))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single-file aiogram 3.x Telegram bot
    Bot {
        /// What the bot should do
        description: String,

        /// Print the generated source after the run
        #[arg(long)]
        print: bool,
    },

    /// Generate a text post
    Post {
        /// Post topic
        topic: String,

        /// Source material to base the post on
        source_text: Option<String>,

        /// Read the source material from a file
        #[arg(long, conflicts_with = "source_text")]
        source_file: Option<PathBuf>,
    },

    /// Query the JSON prompt library
    Prompt(PromptArgs),
}

#[derive(Args, Debug)]
struct PromptArgs {
    /// Prompt number (1-based) or prompt_id
    selector: Option<String>,

    /// Question to ask; read from stdin when omitted
    question: Option<String>,

    /// Directory holding the prompt JSON files
    #[arg(long, default_value = "prompts")]
    dir: PathBuf,

    /// List the available prompts and exit
    #[arg(long)]
    list: bool,

    /// Ask the prompt's bundled test question
    #[arg(long, conflicts_with = "question")]
    use_test_input: bool,

    /// Sampling temperature (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_PROMPT_TEMPERATURE)]
    temperature: f32,

    /// Completion length cap
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let telemetry = match telemetry::init(&cli.log_level, cli.log_json) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let code = tokio::select! {
        outcome = run(cli) => match outcome {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "run failed");
                eprintln!("\nerror: {err:#}");
                ExitCode::from(EXIT_FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted by operator");
            eprintln!("\n\nGeneration interrupted by the operator");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    };

    telemetry.shutdown();
    code
}

#[tracing::instrument(skip_all)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!(model = %cli.gateway.model, "chainsmith starting");

    match cli.command {
        Command::Bot { description, print } => {
            let brief = Brief::new(description)?;
            let report = generate(&cli.gateway, &cli.output_dir, &BOT_PIPELINE, &brief).await?;
            console::print_bot_summary(&report, print);
        }
        Command::Post {
            topic,
            source_text,
            source_file,
        } => {
            let source_text = match source_file {
                Some(path) => Some(
                    tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read source file {}", path.display()))?,
                ),
                None => source_text,
            };
            let mut brief = Brief::new(topic)?;
            if let Some(text) = source_text {
                tracing::info!(chars = text.chars().count(), "source text supplied");
                brief = brief.with_source_text(text);
            }
            let report = generate(&cli.gateway, &cli.output_dir, &POST_PIPELINE, &brief).await?;
            console::print_post_summary(&report);
        }
        Command::Prompt(args) => prompt(&cli.gateway, args).await?,
    }
    Ok(())
}

async fn generate(
    gateway: &GatewayArgs,
    output_dir: &Path,
    definition: &PipelineDefinition,
    brief: &Brief,
) -> anyhow::Result<RunReport> {
    let executor = PipelineExecutor::new(
        gateway.provider()?,
        Arc::new(FileArtifactStore::new(output_dir)),
    )
    .with_observer(Arc::new(ConsoleObserver));

    let report = executor.run(definition, brief).await?;
    tracing::info!(
        run_id = %report.run_id,
        fallback_stages = report.fallback_stages().count(),
        saved = report.persistence.is_saved(),
        "generation finished"
    );
    Ok(report)
}

async fn prompt(gateway: &GatewayArgs, args: PromptArgs) -> anyhow::Result<()> {
    let library = PromptLibrary::load(&args.dir)?;
    console::print_skipped(&library);

    let Some(selector) = args.selector.as_deref().filter(|_| !args.list) else {
        console::print_prompt_list(&library);
        return Ok(());
    };
    let prompt = library.select(selector)?;

    let question = if args.use_test_input {
        prompt.test_input()?.to_string()
    } else if let Some(question) = args.question {
        question
    } else {
        eprintln!("Enter your question, then press Ctrl-D:");
        read_detached(std::io::stdin())
            .await
            .context("stdin reader stopped unexpectedly")?
            .context("failed to read the question from stdin")?
    };
    if question.trim().is_empty() {
        return Err(PipelineError::Precondition {
            message: "the question is empty".to_string(),
        }
        .into());
    }

    let provider = gateway.provider()?;
    console::print_request_info(prompt, provider.model_name(), args.temperature, args.max_tokens);
    let completion = ask(
        provider.as_ref(),
        prompt,
        question.trim(),
        args.temperature,
        args.max_tokens,
    )
    .await?;
    console::print_answer(prompt, &completion);
    Ok(())
}

/// Reads `reader` to EOF on a detached thread.
///
/// The thread is never joined, so an interrupt that drops the receiver lets
/// the process exit while the read is still blocked.
fn read_detached<R>(mut reader: R) -> oneshot::Receiver<std::io::Result<String>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut buffer = String::new();
        let result = reader.read_to_string(&mut buffer).map(|_| buffer);
        // The receiver is gone after an interrupt.
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io::Cursor, sync::mpsc, time::Duration};

    /// Blocks every read until its sender is dropped.
    struct Stalled(mpsc::Receiver<()>);

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn timeout_flag_reaches_the_gateway_args() {
        let cli = Cli::try_parse_from(["chainsmith", "--timeout-secs", "15", "bot", "echo bot"]).unwrap();
        assert_eq!(cli.gateway.timeout_secs, 15);
        assert!(matches!(cli.command, Command::Bot { ref description, .. } if description == "echo bot"));
    }

    #[tokio::test]
    async fn detached_read_returns_the_whole_input() {
        let text = read_detached(Cursor::new("How do I\nsplit a module?"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(text, "How do I\nsplit a module?");
    }

    #[tokio::test]
    async fn interrupt_does_not_wait_for_a_blocked_read() {
        let (hold_open, stalled) = mpsc::channel::<()>();
        // The read stays blocked past runtime shutdown.
        std::mem::forget(hold_open);
        let interrupt = tokio::time::sleep(Duration::from_millis(20));

        let interrupted = tokio::select! {
            _ = read_detached(Stalled(stalled)) => false,
            _ = interrupt => true,
        };

        assert!(interrupted);
    }
}
