//! Pipeline orchestration: configuration, cancellation, the job
//! response contract, and the orchestrator itself.

pub mod cancel;
pub mod config;
pub mod orchestrator;

pub use cancel::CancelHandle;
pub use config::PipelineConfig;
pub use orchestrator::Orchestrator;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Terminal job state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// The execution contract: what `execute` hands back for one
/// job, success or failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobResponse {
    pub job_id: String,
    pub status: JobStatus,
    /// Absolute path of the emitted deck file, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_path: Option<PathBuf>,
    /// Final reviewer total, 0.0 when no review ran.
    pub quality_score: f64,
    /// Whether the final score met the configured target.
    pub quality_passed: bool,
    /// Reviewer passes executed.
    pub iterations: u32,
    pub elapsed: Duration,
    /// Degradation reasons accumulated along the way (fallback data,
    /// deterministic SCR partition, …). Empty on a clean run.
    #[serde(default)]
    pub degraded: Vec<String>,
    /// Fatal error chain, populated only on failure.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl JobResponse {
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
