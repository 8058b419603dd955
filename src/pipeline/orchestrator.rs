//! The pipeline orchestrator: stage ordering, artifact propagation,
//! progress publishing, quality iteration, deadlines, cancellation.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::artifacts::DocumentInput;
use crate::emitter::DeckEmitter;
use crate::llm::{CompletionProvider, LlmClient};
use crate::progress::{
    PreviewEntry, ProgressPublisher, ProgressSnapshot, ProgressStore, Stage,
};
use crate::quality::Criterion;
use crate::stages::{
    Analyst, Designer, Reviewer, StageContext, StageError, StageOutcome, Storyteller, Strategist,
    ThemeDesigner,
};

use super::{CancelHandle, JobResponse, JobStatus, PipelineConfig};

/// Internal failure classification the response is built from.
enum JobFailure {
    /// Observer-initiated cancellation: no further progress writes.
    Aborted,
    /// Anything else fatal: a terminal `Failed` snapshot is published.
    Fatal(String),
}

impl From<StageError> for JobFailure {
    fn from(error: StageError) -> Self {
        if error.is_aborted() {
            JobFailure::Aborted
        } else {
            JobFailure::Fatal(error.to_string())
        }
    }
}

struct RunState {
    iterations: u32,
    degraded: Vec<String>,
}

struct PipelineSuccess {
    deck_path: std::path::PathBuf,
    score: crate::quality::QualityScore,
}

/// Drives jobs through the five stages with bounded quality iteration.
///
/// One orchestrator serves many jobs; jobs are isolated from each other;
/// the shared pieces are the LLM client and the progress store, exactly
/// the only cross-job mutable handles in the system.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use deckweaver::artifacts::{DocumentInput, Language};
/// use deckweaver::emitter::JsonDeckEmitter;
/// use deckweaver::pipeline::Orchestrator;
/// use deckweaver::progress::MemoryProgressStore;
///
/// # async fn example(provider: Arc<dyn deckweaver::llm::CompletionProvider>) {
/// let orchestrator = Orchestrator::new(
///     provider,
///     Arc::new(MemoryProgressStore::new()),
///     Arc::new(JsonDeckEmitter::new("output")),
/// );
/// let input = DocumentInput::new("Revenue grew 12% …")
///     .with_num_slides(10)
///     .with_language(Language::En);
/// let response = orchestrator.execute("job-42", input).await;
/// assert!(response.is_completed());
/// # }
/// ```
pub struct Orchestrator {
    llm: LlmClient,
    store: Arc<dyn ProgressStore>,
    designer: Arc<dyn Designer>,
    emitter: Arc<dyn DeckEmitter>,
    config: PipelineConfig,
    mirror: Option<flume::Sender<ProgressSnapshot>>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ProgressStore>,
        emitter: Arc<dyn DeckEmitter>,
    ) -> Self {
        Self::with_config(provider, store, emitter, PipelineConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ProgressStore>,
        emitter: Arc<dyn DeckEmitter>,
        config: PipelineConfig,
    ) -> Self {
        let llm = LlmClient::new(provider)
            .with_timeout(config.llm_timeout)
            .with_max_attempts(config.llm_retries);
        Self {
            llm,
            store,
            designer: Arc::new(ThemeDesigner::new()),
            emitter,
            config,
            mirror: None,
        }
    }

    /// Swap in an external design collaborator.
    #[must_use]
    pub fn with_designer(mut self, designer: Arc<dyn Designer>) -> Self {
        self.designer = designer;
        self
    }

    /// Mirror every progress snapshot to a channel (testing, streaming).
    #[must_use]
    pub fn with_progress_mirror(mut self, mirror: flume::Sender<ProgressSnapshot>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Run one job to completion. Cancellation is not exposed on this
    /// entry point; see [`execute_cancellable`](Self::execute_cancellable).
    pub async fn execute(&self, job_id: impl Into<String>, input: DocumentInput) -> JobResponse {
        self.execute_cancellable(job_id, input, CancelHandle::new())
            .await
    }

    /// Run one job with an observer-controlled cancellation handle.
    #[instrument(skip_all, fields(job_id))]
    pub async fn execute_cancellable(
        &self,
        job_id: impl Into<String>,
        input: DocumentInput,
        cancel: CancelHandle,
    ) -> JobResponse {
        let mut job_id = job_id.into();
        if job_id.trim().is_empty() {
            job_id = Uuid::new_v4().to_string();
        }
        tracing::Span::current().record("job_id", job_id.as_str());
        let started = Instant::now();

        let mut publisher =
            ProgressPublisher::new(&job_id, self.store.clone(), self.config.progress_ttl);
        if let Some(mirror) = &self.mirror {
            publisher = publisher.with_mirror(mirror.clone());
        }

        if let Err(error) = input.validate() {
            publisher
                .publish(ProgressSnapshot::stage(Stage::Failed).with_error(error.to_string()))
                .await;
            return Self::failed_response(job_id, started, 0, Vec::new(), vec![error.to_string()]);
        }

        let ctx = StageContext {
            job_id: job_id.clone(),
            llm: self.llm.clone(),
            language: input.language.clone(),
            scr_timeout: self.config.scr_timeout,
            cancel,
        };
        let mut state = RunState {
            iterations: 0,
            degraded: Vec::new(),
        };

        let outcome = timeout(
            self.config.job_timeout,
            self.run_pipeline(&ctx, &input, &mut publisher, &mut state),
        )
        .await;

        match outcome {
            Ok(Ok(success)) => {
                info!(
                    score = %format!("{:.3}", success.score.total),
                    iterations = state.iterations,
                    "job completed"
                );
                JobResponse {
                    job_id,
                    status: JobStatus::Completed,
                    deck_path: Some(success.deck_path),
                    quality_score: success.score.total,
                    quality_passed: success.score.passed,
                    iterations: state.iterations,
                    elapsed: started.elapsed(),
                    degraded: state.degraded,
                    errors: Vec::new(),
                }
            }
            Ok(Err(JobFailure::Aborted)) => {
                // No further progress writes once cancellation is observed.
                warn!("job aborted by observer");
                Self::failed_response(
                    job_id,
                    started,
                    state.iterations,
                    state.degraded,
                    vec!["aborted".to_string()],
                )
            }
            Ok(Err(JobFailure::Fatal(message))) => {
                warn!(error = %message, "job failed");
                publisher
                    .publish(ProgressSnapshot::stage(Stage::Failed).with_error(message.clone()))
                    .await;
                Self::failed_response(
                    job_id,
                    started,
                    state.iterations,
                    state.degraded,
                    vec![message],
                )
            }
            Err(_) => {
                let message = format!("job exceeded {:?} deadline", self.config.job_timeout);
                warn!("job timed out");
                publisher
                    .publish(ProgressSnapshot::stage(Stage::Failed).with_error(message.clone()))
                    .await;
                Self::failed_response(
                    job_id,
                    started,
                    state.iterations,
                    state.degraded,
                    vec![message],
                )
            }
        }
    }

    fn failed_response(
        job_id: String,
        started: Instant,
        iterations: u32,
        degraded: Vec<String>,
        errors: Vec<String>,
    ) -> JobResponse {
        JobResponse {
            job_id,
            status: JobStatus::Failed,
            deck_path: None,
            quality_score: 0.0,
            quality_passed: false,
            iterations,
            elapsed: started.elapsed(),
            degraded,
            errors,
        }
    }

    /// The main stage sequence plus the partial re-run loop.
    async fn run_pipeline(
        &self,
        ctx: &StageContext,
        input: &DocumentInput,
        publisher: &mut ProgressPublisher,
        state: &mut RunState,
    ) -> Result<PipelineSuccess, JobFailure> {
        let reviewer = Reviewer::new(self.config.target_quality);

        Self::boundary(ctx)?;
        publisher.publish_stage(Stage::DocumentAnalysis).await;
        let mut strategy = self.run_strategist(ctx, input, state).await?;

        Self::boundary(ctx)?;
        publisher.publish_stage(Stage::DataExtraction).await;
        let mut analysis = self.run_analyst(ctx, input, state).await?;

        Self::boundary(ctx)?;
        publisher
            .publish(
                ProgressSnapshot::stage(Stage::StructureDesign)
                    .with_preview(Self::preview(&strategy.outline)),
            )
            .await;
        let mut narrative = self.run_storyteller(ctx, &strategy, state).await?;

        Self::boundary(ctx)?;
        publisher.publish_stage(Stage::DesignApplication).await;
        let mut deck = self
            .run_designer(ctx, &strategy, &analysis, &narrative)
            .await?;

        Self::boundary(ctx)?;
        publisher.publish_stage(Stage::QualityReview).await;
        let mut deck_path = self.emit_draft(ctx, &deck, 1).await?;
        let (mut score, _) = reviewer
            .run(ctx, &deck, &analysis.insights, &strategy.pyramid)
            .into_parts()?;
        state.iterations = 1;

        // Refinement loop: replay the stages the high-priority hints
        // implicate, reuse everything upstream of them verbatim.
        while !score.passed && state.iterations < self.config.max_iterations {
            let targets: BTreeSet<&'static str> = score
                .high_priority_hints()
                .map(|h| match h.criterion {
                    Criterion::Clarity | Criterion::Insight => "analyst",
                    Criterion::Actionability => "storyteller",
                    Criterion::Structure => "strategist",
                    Criterion::Visual => "designer",
                })
                .collect();
            if targets.is_empty() {
                // Nothing actionable to replay; iterating further would
                // not move the score.
                break;
            }
            info!(iteration = state.iterations + 1, ?targets, "replaying stages");

            let replay_strategist = targets.contains("strategist");
            let replay_analyst = replay_strategist || targets.contains("analyst");
            let replay_storyteller = replay_strategist || targets.contains("storyteller");

            if replay_strategist {
                Self::boundary(ctx)?;
                publisher.publish_stage(Stage::DocumentAnalysis).await;
                strategy = self.run_strategist(ctx, input, state).await?;
            }
            if replay_analyst {
                Self::boundary(ctx)?;
                publisher.publish_stage(Stage::DataExtraction).await;
                analysis = self.run_analyst(ctx, input, state).await?;
            }
            if replay_storyteller {
                Self::boundary(ctx)?;
                publisher
                    .publish(
                        ProgressSnapshot::stage(Stage::StructureDesign)
                            .with_preview(Self::preview(&strategy.outline)),
                    )
                    .await;
                narrative = self.run_storyteller(ctx, &strategy, state).await?;
            }

            Self::boundary(ctx)?;
            publisher.publish_stage(Stage::DesignApplication).await;
            deck = self
                .run_designer(ctx, &strategy, &analysis, &narrative)
                .await?;

            Self::boundary(ctx)?;
            publisher.publish_stage(Stage::QualityReview).await;
            deck_path = self.emit_draft(ctx, &deck, state.iterations + 1).await?;
            let (next, _) = reviewer
                .run(ctx, &deck, &analysis.insights, &strategy.pyramid)
                .into_parts()?;
            score = next;
            state.iterations += 1;
        }

        Self::boundary(ctx)?;
        publisher.publish_stage(Stage::Completed).await;
        Ok(PipelineSuccess { deck_path, score })
    }

    /// Emit the deck the reviewer is about to score. The first pass keeps
    /// the plain job name; refinement passes carry an iteration suffix,
    /// and the last emitted file is the one the response points at.
    async fn emit_draft(
        &self,
        ctx: &StageContext,
        deck: &crate::artifacts::StyledDeck,
        pass: u32,
    ) -> Result<std::path::PathBuf, JobFailure> {
        let filename = if pass <= 1 {
            format!("deck_{}", ctx.job_id)
        } else {
            format!("deck_{}_iter{pass}", ctx.job_id)
        };
        self.emitter
            .emit(deck, &filename)
            .await
            .map_err(|e| JobFailure::Fatal(e.to_string()))
    }

    async fn run_strategist(
        &self,
        ctx: &StageContext,
        input: &DocumentInput,
        state: &mut RunState,
    ) -> Result<crate::stages::StrategistOutput, JobFailure> {
        let outcome = self
            .bounded("strategist", Strategist::run(ctx, input))
            .await;
        let (value, degraded) = outcome.into_parts()?;
        Self::note_degradation(state, degraded);
        Ok(value)
    }

    async fn run_analyst(
        &self,
        ctx: &StageContext,
        input: &DocumentInput,
        state: &mut RunState,
    ) -> Result<crate::stages::AnalystOutput, JobFailure> {
        let outcome = self
            .bounded("analyst", Analyst::run(ctx, &input.document))
            .await;
        let (value, degraded) = outcome.into_parts()?;
        Self::note_degradation(state, degraded);
        Ok(value)
    }

    async fn run_storyteller(
        &self,
        ctx: &StageContext,
        strategy: &crate::stages::StrategistOutput,
        state: &mut RunState,
    ) -> Result<crate::artifacts::Narrative, JobFailure> {
        let outcome = self
            .bounded(
                "storyteller",
                Storyteller::run(ctx, &strategy.outline, &strategy.pyramid),
            )
            .await;
        let (value, degraded) = outcome.into_parts()?;
        Self::note_degradation(state, degraded);
        Ok(value)
    }

    async fn run_designer(
        &self,
        ctx: &StageContext,
        strategy: &crate::stages::StrategistOutput,
        analysis: &crate::stages::AnalystOutput,
        narrative: &crate::artifacts::Narrative,
    ) -> Result<crate::artifacts::StyledDeck, JobFailure> {
        let outcome = self
            .bounded(
                "designer",
                self.designer.design(
                    ctx,
                    &strategy.outline,
                    &analysis.chart_specs,
                    &analysis.insights,
                    narrative,
                ),
            )
            .await;
        let (value, _) = outcome.into_parts()?;
        Ok(value)
    }

    /// Apply the per-stage deadline on top of whatever deadlines the
    /// stage enforces internally; the tightest one wins.
    async fn bounded<T>(
        &self,
        stage: &'static str,
        fut: impl Future<Output = StageOutcome<T>>,
    ) -> StageOutcome<T> {
        match timeout(self.config.per_stage_timeout, fut).await {
            Ok(outcome) => outcome,
            Err(_) => StageOutcome::Fatal(StageError::Timeout {
                stage,
                limit: self.config.per_stage_timeout,
            }),
        }
    }

    fn boundary(ctx: &StageContext) -> Result<(), JobFailure> {
        ctx.guard().map_err(JobFailure::from)
    }

    fn note_degradation(state: &mut RunState, reason: Option<String>) {
        if let Some(reason) = reason
            && !state.degraded.contains(&reason)
        {
            state.degraded.push(reason);
        }
    }

    fn preview(outline: &crate::artifacts::Outline) -> Vec<PreviewEntry> {
        outline
            .iter()
            .map(|slide| PreviewEntry {
                slide: slide.number,
                title: slide.title.clone(),
                layout: slide.layout_type.to_string(),
            })
            .collect()
    }
}
