//! Per-job publisher enforcing the snapshot ordering rules.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::store::ProgressStore;
use super::{ProgressSnapshot, Stage};

/// Write-only handle a job uses to publish its snapshots.
///
/// Guarantees, per job:
/// - percent values are clamped to the running maximum (monotonically
///   non-decreasing as observers see them);
/// - `updated_at` is stamped at publish time;
/// - nothing is published after a terminal stage (`Completed`/`Failed`);
/// - store failures are logged and swallowed; observers losing sight of
///   a job must not fail the job.
///
/// Snapshots are optionally mirrored to a `flume` channel so tests and
/// in-process observers can assert on the exact sequence.
pub struct ProgressPublisher {
    job_id: String,
    store: Arc<dyn ProgressStore>,
    ttl: Duration,
    highest_percent: u8,
    terminal_seen: bool,
    mirror: Option<flume::Sender<ProgressSnapshot>>,
}

impl ProgressPublisher {
    pub fn new(job_id: impl Into<String>, store: Arc<dyn ProgressStore>, ttl: Duration) -> Self {
        Self {
            job_id: job_id.into(),
            store,
            ttl,
            highest_percent: 0,
            terminal_seen: false,
            mirror: None,
        }
    }

    /// Mirror every published snapshot to `sender` as well.
    #[must_use]
    pub fn with_mirror(mut self, sender: flume::Sender<ProgressSnapshot>) -> Self {
        self.mirror = Some(sender);
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Whether a terminal snapshot has already been published.
    pub fn is_terminal(&self) -> bool {
        self.terminal_seen
    }

    /// Publish a stage snapshot with its nominal percent.
    pub async fn publish_stage(&mut self, stage: Stage) {
        self.publish(ProgressSnapshot::stage(stage)).await;
    }

    /// Publish a snapshot, applying the ordering rules.
    pub async fn publish(&mut self, mut snapshot: ProgressSnapshot) {
        if self.terminal_seen {
            debug!(
                job_id = %self.job_id,
                stage = %snapshot.current_stage,
                "dropping snapshot after terminal stage"
            );
            return;
        }
        snapshot.progress = snapshot.progress.clamp(self.highest_percent, 100);
        snapshot.updated_at = Utc::now();
        self.highest_percent = snapshot.progress;
        self.terminal_seen = snapshot.current_stage.is_terminal();

        if let Some(mirror) = &self.mirror {
            let _ = mirror.try_send(snapshot.clone());
        }
        if let Err(err) = self.store.put(&self.job_id, snapshot, self.ttl).await {
            warn!(job_id = %self.job_id, error = %err, "progress write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::store::MemoryProgressStore;
    use crate::progress::PreviewEntry;

    fn publisher_with_mirror() -> (
        ProgressPublisher,
        flume::Receiver<ProgressSnapshot>,
        MemoryProgressStore,
    ) {
        let store = MemoryProgressStore::new();
        let (tx, rx) = flume::unbounded();
        let publisher = ProgressPublisher::new(
            "job-1",
            Arc::new(store.clone()),
            Duration::from_secs(60),
        )
        .with_mirror(tx);
        (publisher, rx, store)
    }

    #[tokio::test]
    async fn percents_never_decrease() {
        let (mut publisher, rx, _store) = publisher_with_mirror();
        publisher.publish_stage(Stage::StructureDesign).await; // 60
        publisher.publish_stage(Stage::DataExtraction).await; // nominal 40 → clamped
        let seen: Vec<u8> = rx.drain().map(|s| s.progress).collect();
        assert_eq!(seen, vec![60, 60]);
    }

    #[tokio::test]
    async fn nothing_follows_a_terminal_snapshot() {
        let (mut publisher, rx, store) = publisher_with_mirror();
        publisher.publish_stage(Stage::Failed).await;
        publisher.publish_stage(Stage::QualityReview).await;
        assert_eq!(rx.drain().count(), 1);
        let stored = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(stored.current_stage, Stage::Failed);
    }

    #[tokio::test]
    async fn preview_is_capped() {
        let (mut publisher, rx, _store) = publisher_with_mirror();
        let preview = (1..=20)
            .map(|n| PreviewEntry {
                slide: n,
                title: format!("Slide {n}"),
                layout: "title_and_content".into(),
            })
            .collect();
        publisher
            .publish(ProgressSnapshot::stage(Stage::StructureDesign).with_preview(preview))
            .await;
        let snapshot = rx.recv().unwrap();
        assert_eq!(
            snapshot.structure_preview.len(),
            ProgressSnapshot::MAX_PREVIEW
        );
    }
}
