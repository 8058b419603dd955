//! Keyed snapshot store with TTL semantics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::ProgressSnapshot;

/// Store-side failure. The publisher logs and swallows these: a broken
/// observer channel must never fail the job.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("progress store unavailable: {message}")]
    #[diagnostic(code(deckweaver::progress::store_unavailable))]
    Unavailable { message: String },
}

/// External keyed key/value store boundary. Writes are
/// last-write-wins per job id; entries expire after the supplied TTL.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn put(
        &self,
        job_id: &str,
        snapshot: ProgressSnapshot,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Most recent snapshot for a job, if present and not expired.
    async fn get(&self, job_id: &str) -> Result<Option<ProgressSnapshot>, StoreError>;
}

struct Entry {
    snapshot: ProgressSnapshot,
    expires_at: Instant,
}

/// In-process implementation backed by a mutex-guarded map with lazy TTL
/// expiry. The default store for tests and single-process deployments;
/// production deployments adapt their keyed cache behind the same trait.
#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    entries: Arc<Mutex<FxHashMap<String, Entry>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn put(
        &self,
        job_id: &str,
        snapshot: ProgressSnapshot,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.retain(|_, e| e.expires_at > Instant::now());
        entries.insert(
            job_id.to_string(),
            Entry {
                snapshot,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<ProgressSnapshot>, StoreError> {
        let entries = self.entries.lock();
        Ok(entries
            .get(job_id)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.snapshot.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Stage;

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryProgressStore::new();
        let ttl = Duration::from_secs(60);
        store
            .put("job-1", ProgressSnapshot::stage(Stage::DocumentAnalysis), ttl)
            .await
            .unwrap();
        store
            .put("job-1", ProgressSnapshot::stage(Stage::DataExtraction), ttl)
            .await
            .unwrap();
        let got = store.get("job-1").await.unwrap().unwrap();
        assert_eq!(got.current_stage, Stage::DataExtraction);
    }

    #[tokio::test]
    async fn expired_entries_are_invisible() {
        let store = MemoryProgressStore::new();
        store
            .put(
                "job-1",
                ProgressSnapshot::stage(Stage::Completed),
                Duration::ZERO,
            )
            .await
            .unwrap();
        assert!(store.get("job-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn jobs_are_isolated() {
        let store = MemoryProgressStore::new();
        let ttl = Duration::from_secs(60);
        store
            .put("a", ProgressSnapshot::stage(Stage::Completed), ttl)
            .await
            .unwrap();
        assert!(store.get("b").await.unwrap().is_none());
    }
}
