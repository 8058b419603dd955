//! The five specialist stages and their shared execution plumbing.
//!
//! Stages are stateless across invocations: each consumes typed inputs,
//! calls the LLM client and/or pure transformers, and returns a
//! [`StageOutcome`]. Errors never escape as panics or raw `?` chains into
//! the orchestrator; the outcome sum type is the contract:
//!
//! - `Ok(value)`: the stage produced its artifact normally.
//! - `Degraded(value, reason)`: the stage produced a usable artifact
//!   through a deterministic fallback; the reason surfaces in the job
//!   response metadata.
//! - `Fatal(error)`: the job cannot continue.

pub mod analyst;
pub mod designer;
pub mod ladder;
pub mod reviewer;
pub mod storyteller;
pub mod strategist;

pub use analyst::{Analyst, AnalystOutput};
pub use designer::{Designer, ThemeDesigner};
pub use reviewer::Reviewer;
pub use storyteller::Storyteller;
pub use strategist::{Strategist, StrategistOutput};

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::artifacts::Language;
use crate::llm::{CompletionRequest, LlmClient, LlmError, ParseError};
use crate::pipeline::CancelHandle;

/// Failure modes a stage can report.
#[derive(Debug, Error, Diagnostic)]
pub enum StageError {
    #[error("LLM failure in {stage}: {source}")]
    #[diagnostic(code(deckweaver::stage::llm))]
    Llm {
        stage: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("unparseable reply in {stage}: {source}")]
    #[diagnostic(code(deckweaver::stage::parse))]
    Parse {
        stage: &'static str,
        #[source]
        source: ParseError,
    },

    #[error("pyramid violates MECE invariant: {details}")]
    #[diagnostic(code(deckweaver::stage::mece))]
    MeceViolation { details: String },

    #[error("outline is structurally invalid: {details}")]
    #[diagnostic(code(deckweaver::stage::outline))]
    OutlineInvalid { details: String },

    #[error("transition generation failed: {message}")]
    #[diagnostic(code(deckweaver::stage::transitions))]
    Transitions { message: String },

    #[error("speaker note generation failed: {message}")]
    #[diagnostic(code(deckweaver::stage::speaker_notes))]
    SpeakerNotes { message: String },

    #[error("stage {stage} exceeded its {limit:?} deadline")]
    #[diagnostic(code(deckweaver::stage::timeout))]
    Timeout {
        stage: &'static str,
        limit: Duration,
    },

    #[error("job aborted")]
    #[diagnostic(code(deckweaver::stage::aborted))]
    Aborted,
}

impl StageError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, StageError::Aborted)
    }
}

/// Result sum type every stage returns; no exceptions as
/// control flow.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Ok(T),
    Degraded(T, String),
    Fatal(StageError),
}

impl<T> StageOutcome<T> {
    /// Split into the value and an optional degradation reason, or the
    /// fatal error. The orchestrator's main pattern-match.
    pub fn into_parts(self) -> Result<(T, Option<String>), StageError> {
        match self {
            StageOutcome::Ok(value) => Ok((value, None)),
            StageOutcome::Degraded(value, reason) => Ok((value, Some(reason))),
            StageOutcome::Fatal(error) => Err(error),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StageOutcome::Fatal(_))
    }
}

impl<T> From<StageError> for StageOutcome<T> {
    fn from(error: StageError) -> Self {
        StageOutcome::Fatal(error)
    }
}

/// Per-job execution context handed to every stage.
///
/// Carries the shared LLM client, the job's cancellation flag, and the
/// configuration slice stages actually need. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct StageContext {
    pub job_id: String,
    pub llm: LlmClient,
    pub language: Language,
    /// Deadline for the storyteller's SCR sub-step.
    pub scr_timeout: Duration,
    pub cancel: CancelHandle,
}

impl StageContext {
    /// Return `Aborted` once cancellation has been observed.
    pub fn guard(&self) -> Result<(), StageError> {
        if self.cancel.is_cancelled() {
            Err(StageError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Cancellation-aware completion call: checked before the call, and
    /// again after it returns so an in-flight reply finishing during
    /// cancellation is discarded.
    pub async fn generate(
        &self,
        stage: &'static str,
        request: CompletionRequest,
    ) -> Result<String, StageError> {
        self.guard()?;
        let reply = self
            .llm
            .generate_with(request)
            .await
            .map_err(|source| StageError::Llm { stage, source })?;
        self.guard()?;
        Ok(reply)
    }

    /// Like [`generate`](Self::generate) but without the client's retry
    /// budget. For sub-steps that manage their own attempt loop (the
    /// storyteller's SCR step), so the two budgets do not multiply.
    pub async fn generate_once(
        &self,
        stage: &'static str,
        request: CompletionRequest,
    ) -> Result<String, StageError> {
        self.guard()?;
        let reply = self
            .llm
            .clone()
            .with_max_attempts(1)
            .generate_with(request)
            .await
            .map_err(|source| StageError::Llm { stage, source })?;
        self.guard()?;
        Ok(reply)
    }
}
