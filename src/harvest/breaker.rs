//! Adaptive block guard. Watches the stream of refused lookups and halts
//! dispatch once the pattern looks like the remote is denying this client's
//! address range rather than reporting missing entities. Work already
//! collected stays valid; only new submissions stop.

use crate::harvest::counters::RunCounters;
use crate::source::outcome::RateLimit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Circuit breaker over rate-limited outcomes.
///
/// Trips when either a single hard-block status arrives, or the ambiguous
/// refusals exceed `trip_ratio` of attempts so far while successes stay under
/// `success_floor` of attempts. Both ratios are policy knobs, not constants:
/// the values that match a given provider's throttling behaviour can only be
/// tuned empirically.
#[derive(Debug)]
pub struct BlockGuard {
    counters: Arc<RunCounters>,
    cancel: CancellationToken,
    trip_ratio: f64,
    success_floor: f64,
    min_attempts: u64,
    tripped: AtomicBool,
    diagnosed: AtomicBool,
}

impl BlockGuard {
    pub fn new(
        counters: Arc<RunCounters>,
        cancel: CancellationToken,
        trip_ratio: f64,
        success_floor: f64,
        min_attempts: u64,
    ) -> Self {
        Self {
            counters,
            cancel,
            trip_ratio,
            success_floor,
            min_attempts: min_attempts.max(1),
            tripped: AtomicBool::new(false),
            diagnosed: AtomicBool::new(false),
        }
    }

    /// Evaluates a refused lookup against the trip conditions. Returns `true`
    /// only for the single call that actually tripped the guard, even when
    /// several workers satisfy the condition in the same instant.
    ///
    /// Expects the refusal to already be tallied in the shared counters.
    pub fn observe_rate_limited(&self, limit: &RateLimit) -> bool {
        if self.tripped.load(Ordering::SeqCst) {
            return false;
        }

        if limit.is_hard_block() {
            return self.trip(limit);
        }

        let attempted = self.counters.attempted();
        if attempted < self.min_attempts {
            return false;
        }

        let ambiguous = self.counters.rate_limited() as f64;
        let succeeded = self.counters.succeeded() as f64;
        let attempted = attempted as f64;

        if ambiguous > self.trip_ratio * attempted && succeeded < self.success_floor * attempted {
            return self.trip(limit);
        }

        false
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    fn trip(&self, limit: &RateLimit) -> bool {
        if self.tripped.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.counters.mark_breaker_tripped();

        // Emit the denial diagnostic at most once per run.
        if !self.diagnosed.swap(true, Ordering::SeqCst) {
            tracing::error!(
                origin = %limit.origin(),
                status = limit.status,
                "repeated refusals indicate an address-range denial by the remote; \
                 wait before re-running, reduce the worker pool size, or switch \
                 to a new network identity"
            );
        }

        self.cancel.cancel();
        true
    }
}
