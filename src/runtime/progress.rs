//! Tracks how many lookups have completed and relays the count to the
//! configured observer.

use crate::source::provider::ProgressObserver;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Completion counter shared by all workers. The observer callback is
/// best-effort: a panic inside it is contained and logged so a broken
/// progress display can never take the run down.
pub struct ProgressTracker {
    done: AtomicUsize,
    total: usize,
    observer: Arc<dyn ProgressObserver>,
}

impl ProgressTracker {
    pub fn new(total: usize, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            observer,
        }
    }

    pub fn record_completed(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total;
        let observer = Arc::clone(&self.observer);
        if catch_unwind(AssertUnwindSafe(|| observer.on_progress(done, total))).is_err() {
            tracing::warn!(done, total, "progress observer panicked; update dropped");
        }
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("done", &self.done)
            .field("total", &self.total)
            .finish()
    }
}
