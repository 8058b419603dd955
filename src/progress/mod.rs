//! Progress publishing for asynchronous observers.
//!
//! The pipeline is fire-and-forget from the observer's point of view:
//! each job writes stage/percent snapshots to a keyed store
//! ([`ProgressStore`]) that external readers poll. Writes are
//! last-write-wins per job; intermediate snapshots may be missed, but the
//! terminal one (`Completed` or `Failed`) is durable for the store TTL.
//!
//! [`ProgressPublisher`] owns the per-job ordering rules: percent values
//! are clamped to be monotonically non-decreasing, timestamps are stamped
//! at publish time, and nothing is written after a terminal snapshot.

pub mod publisher;
pub mod store;

pub use publisher::ProgressPublisher;
pub use store::{MemoryProgressStore, ProgressStore, StoreError};

use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::{Deserialize, Serialize};

/// Open an in-process observer feed: the sender plugs into
/// [`ProgressPublisher::with_mirror`] (or the orchestrator's
/// `with_progress_mirror`), the stream yields every published snapshot in
/// order. Useful for streaming progress to connected clients without
/// polling the store.
pub fn observer_feed() -> (flume::Sender<ProgressSnapshot>, impl Stream<Item = ProgressSnapshot>) {
    let (tx, rx) = flume::unbounded();
    (tx, rx.into_stream())
}

/// Pipeline stage tags observers see, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DocumentAnalysis,
    DataExtraction,
    StructureDesign,
    DesignApplication,
    QualityReview,
    Completed,
    Failed,
}

impl Stage {
    /// The nominal percent published when this stage begins.
    pub fn nominal_percent(self) -> u8 {
        match self {
            Stage::DocumentAnalysis => 20,
            Stage::DataExtraction => 40,
            Stage::StructureDesign => 60,
            Stage::DesignApplication => 80,
            Stage::QualityReview => 95,
            Stage::Completed => 100,
            Stage::Failed => 100,
        }
    }

    /// Terminal stages end the snapshot stream for a job.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Stage::DocumentAnalysis => "document_analysis",
            Stage::DataExtraction => "data_extraction",
            Stage::StructureDesign => "structure_design",
            Stage::DesignApplication => "design_application",
            Stage::QualityReview => "quality_review",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(tag)
    }
}

/// One entry of the structural preview published alongside the
/// structure-design stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub slide: usize,
    pub title: String,
    pub layout: String,
}

/// What observers read back for a job id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current_stage: Stage,
    /// Percent in `[0, 100]`, monotonically non-decreasing per job.
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
    /// At most [`ProgressSnapshot::MAX_PREVIEW`] entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structure_preview: Vec<PreviewEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressSnapshot {
    /// Cap on structure-preview length.
    pub const MAX_PREVIEW: usize = 12;

    pub fn stage(stage: Stage) -> Self {
        Self {
            current_stage: stage,
            progress: stage.nominal_percent(),
            updated_at: Utc::now(),
            structure_preview: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_preview(mut self, mut preview: Vec<PreviewEntry>) -> Self {
        preview.truncate(Self::MAX_PREVIEW);
        self.structure_preview = preview;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
