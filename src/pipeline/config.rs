//! Pipeline configuration with environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::Language;

/// Tunables for one orchestrator instance. Instantiated once per
/// process (or per job when jobs need different targets) and passed
/// explicitly; no process-wide mutable state.
///
/// `Default` resolves `DECKWEAVER_*` environment variables (via a
/// `.env` file when present) before falling back to the built-in defaults.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Required reviewer total for `quality_passed` (default 0.85).
    pub target_quality: f64,
    /// Maximum refinement passes (default 3).
    pub max_iterations: u32,
    /// Deadline for each stage run (default 60 s).
    pub per_stage_timeout: Duration,
    /// Deadline for each storyteller SCR attempt (default 15 s).
    pub scr_timeout: Duration,
    /// Outer deadline for the whole job (default 10 min).
    pub job_timeout: Duration,
    /// Per-call LLM deadline (default 60 s).
    pub llm_timeout: Duration,
    /// Attempt budget per LLM call (default 3).
    pub llm_retries: u32,
    /// Target language for prompts and number formatting (default ko).
    pub language: Language,
    /// TTL for progress snapshots in the keyed store (default 1 h).
    pub progress_ttl: Duration,
    /// Where emitted deck files land (default `./output`).
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        dotenvy::dotenv().ok();
        Self {
            target_quality: env_f64("DECKWEAVER_TARGET_QUALITY").unwrap_or(0.85),
            max_iterations: env_u64("DECKWEAVER_MAX_ITERATIONS").unwrap_or(3) as u32,
            per_stage_timeout: env_secs("DECKWEAVER_STAGE_TIMEOUT_SECS", 60),
            scr_timeout: env_secs("DECKWEAVER_SCR_TIMEOUT_SECS", 15),
            job_timeout: env_secs("DECKWEAVER_JOB_TIMEOUT_SECS", 600),
            llm_timeout: env_secs("DECKWEAVER_LLM_TIMEOUT_SECS", 60),
            llm_retries: env_u64("DECKWEAVER_LLM_RETRIES").unwrap_or(3) as u32,
            language: std::env::var("DECKWEAVER_LANGUAGE")
                .map(Language::from)
                .unwrap_or_default(),
            progress_ttl: env_secs("DECKWEAVER_PROGRESS_TTL_SECS", 3600),
            output_dir: std::env::var("DECKWEAVER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn with_target_quality(mut self, target_quality: f64) -> Self {
        self.target_quality = target_quality;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_job_timeout(mut self, job_timeout: Duration) -> Self {
        self.job_timeout = job_timeout;
        self
    }

    #[must_use]
    pub fn with_per_stage_timeout(mut self, per_stage_timeout: Duration) -> Self {
        self.per_stage_timeout = per_stage_timeout;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(env_u64(key).unwrap_or(default))
}
