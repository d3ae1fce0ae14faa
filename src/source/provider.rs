//! Traits implemented by external collaborators: the lookup provider called
//! by workers and the best-effort progress observer.

use crate::source::outcome::FetchOutcome;
use futures::future::BoxFuture;

/// One remote lookup per ticker. Implementations must be safe to call
/// concurrently from independent workers with no shared mutable state between
/// calls, and own their request timeout; the dispatcher imposes no deadline.
pub trait QuoteFetcher: Send + Sync + 'static {
    fn fetch_one<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, FetchOutcome>;
}

/// Progress callback invoked after each completed lookup. May be called
/// concurrently from any worker and must not block; a panicking observer is
/// contained and logged rather than failing the run.
pub trait ProgressObserver: Send + Sync + 'static {
    fn on_progress(&self, done: usize, total: usize);
}

/// Observer that discards progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _done: usize, _total: usize) {}
}
