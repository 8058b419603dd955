//! Observer-initiated job cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag for one job.
///
/// The orchestrator checks it at every stage boundary and stages check it
/// before each LLM call. Once set it stays set; in-flight LLM calls are
/// allowed to complete but their results are discarded.
///
/// # Examples
///
/// ```
/// use deckweaver::pipeline::CancelHandle;
///
/// let handle = CancelHandle::new();
/// let observer = handle.clone();
/// assert!(!handle.is_cancelled());
/// observer.cancel();
/// assert!(handle.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
