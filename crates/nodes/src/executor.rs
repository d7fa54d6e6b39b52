//! The pipeline orchestrator.
//!
//! [`PipelineExecutor::run`] drives one run through a fixed state machine:
//!
//! ```text
//! Start → stage 1 … stage N (generation) → review (advisory) → persist → Done
//!              └──────── gateway error ────────┘→ Failed (nothing persisted)
//! ```
//!
//! Stages execute strictly one after another. Each stage's fields are merged
//! into the context before the next stage renders its prompt, so downstream
//! stages always see merged values, whether decoded or defaulted.

use std::{path::PathBuf, sync::Arc};

use pipeline::{
    display_value, Artifact, ArtifactStore, Brief, Clock, LlmProvider, NoopObserver,
    PipelineContext, PipelineDefinition, PipelineError, PipelineName, PipelineRunId,
    ReviewVerdict, RunObserver, StageId, StagePosition, StageSpec, SystemClock,
};

use crate::stage::run_stage;

/// What happened to one stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    /// The stage.
    pub stage: StageId,
    /// Set when the stage's defaults replaced undecodable output.
    pub fallback_cause: Option<String>,
}

/// Result of the persistence step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// The document was written to this location.
    Saved(PathBuf),
    /// The document could not be written. The run is still complete.
    Failed {
        /// Location that could not be written.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

impl Persistence {
    /// Returns `true` when the document was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier, as recorded in spans.
    pub run_id: PipelineRunId,
    /// Pipeline that ran.
    pub pipeline: PipelineName,
    /// The generated artifact, unchanged by review.
    pub artifact: Artifact,
    /// The advisory review.
    pub review: ReviewVerdict,
    /// Per-stage records, review last.
    pub stages: Vec<StageRecord>,
    /// Final context.
    pub context: PipelineContext,
    /// Outcome of the save step.
    pub persistence: Persistence,
}

impl RunReport {
    /// Stages whose defaults were substituted.
    pub fn fallback_stages(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages.iter().filter(|record| record.fallback_cause.is_some())
    }
}

/// Runs pipeline definitions against injected ports.
///
/// One executor may run many pipelines, one at a time; no state is kept
/// between runs.
pub struct PipelineExecutor {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn RunObserver>,
}

impl PipelineExecutor {
    /// Creates an executor using the wall clock and no progress reporting.
    pub fn new(provider: Arc<dyn LlmProvider>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            provider,
            store,
            clock: Arc::new(SystemClock),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the clock used for file headers.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs `definition` for `brief`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Gateway`] when any stage's provider call fails; the
    ///   run stops and nothing is persisted.
    /// - [`PipelineError::Configuration`] when `definition` has no artifact
    ///   stage.
    ///
    /// A failed save is not an error; see [`RunReport::persistence`].
    #[tracing::instrument(
        skip_all,
        fields(pipeline = %definition.name, run_id = tracing::field::Empty)
    )]
    pub async fn run(
        &self,
        definition: &PipelineDefinition,
        brief: &Brief,
    ) -> Result<RunReport, PipelineError> {
        let artifact_key = definition
            .artifact_key()
            .ok_or_else(|| PipelineError::Configuration {
                message: format!("pipeline '{}' has no artifact stage", definition.name),
            })?;

        let run_id = PipelineRunId::new_random();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        tracing::info!(
            subject_chars = brief.subject().chars().count(),
            has_source_text = brief.source_text().is_some(),
            "starting pipeline run"
        );
        self.observer.run_started(definition, brief);

        let mut context = PipelineContext::seed(brief, definition.brief_key);
        let total = definition.stages.len();
        let mut records = Vec::with_capacity(total + 1);

        for (offset, stage) in definition.stages.iter().enumerate() {
            let position = StagePosition {
                index: offset + 1,
                total,
                is_review: false,
            };
            records.push(self.execute(stage, position, &mut context).await?);
        }

        let artifact = Artifact::new(context.get(artifact_key).map(display_value).unwrap_or_default());
        tracing::info!(
            chars = artifact.char_count(),
            lines = artifact.line_count(),
            "artifact generated"
        );
        self.observer.artifact_ready(&artifact);

        let position = StagePosition {
            index: total + 1,
            total,
            is_review: true,
        };
        let review_record = self
            .execute(&definition.review.stage, position, &mut context)
            .await?;
        let review = definition
            .review
            .verdict(&context, review_record.fallback_cause.is_some());
        records.push(review_record);
        tracing::info!(approved = review.approved, verdict = %review.verdict, "review finished");
        self.observer.review_ready(&definition.review, &review);

        let document = definition
            .output
            .render_document(brief.subject(), self.clock.now(), &artifact);
        let persistence = match self.store.persist(&definition.output.file, &document).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "artifact saved");
                Persistence::Saved(path)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to save artifact");
                Persistence::Failed {
                    reason: err.source.to_string(),
                    path: err.path,
                }
            }
        };

        Ok(RunReport {
            run_id,
            pipeline: definition.name.clone(),
            artifact,
            review,
            stages: records,
            context,
            persistence,
        })
    }

    async fn execute(
        &self,
        stage: &StageSpec,
        position: StagePosition,
        context: &mut PipelineContext,
    ) -> Result<StageRecord, PipelineError> {
        self.observer.stage_started(stage, position);

        let outcome = run_stage(self.provider.as_ref(), stage, context).await?;
        let fallback_cause = outcome.fallback_cause().map(str::to_owned);
        if let Some(cause) = &fallback_cause {
            tracing::warn!(stage = %stage.id, %cause, "stage output not decodable; using defaults");
        }

        let shadowed = context.merge(outcome.into_fields());
        if !shadowed.is_empty() {
            tracing::debug!(stage = %stage.id, ?shadowed, "stage replaced earlier fields");
        }

        self.observer
            .stage_finished(stage, position, fallback_cause.as_deref(), context);
        Ok(StageRecord {
            stage: stage.id.clone(),
            fallback_cause,
        })
    }
}
