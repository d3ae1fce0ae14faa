//! Atomic per-run tallies. One instance is shared by every worker; all
//! increments are relaxed atomics since the counters only feed reporting and
//! the block guard's ratio checks.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Mutable run-scoped state: created at run start, incremented throughout
/// dispatch, read at finalization.
#[derive(Debug, Default)]
pub struct RunCounters {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    not_found: AtomicU64,
    rate_limited: AtomicU64,
    transient: AtomicU64,
    breaker_tripped: AtomicBool,
}

impl RunCounters {
    pub fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transient(&self) {
        self.transient.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_breaker_tripped(&self) {
        self.breaker_tripped.store(true, Ordering::SeqCst);
    }

    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn rate_limited(&self) -> u64 {
        self.rate_limited.load(Ordering::Relaxed)
    }

    pub fn breaker_tripped(&self) -> bool {
        self.breaker_tripped.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            transient: self.transient.load(Ordering::Relaxed),
            breaker_tripped: self.breaker_tripped.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of the counters for reporting.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct CountersSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub not_found: u64,
    pub rate_limited: u64,
    pub transient: u64,
    pub breaker_tripped: bool,
}

impl CountersSnapshot {
    /// Failures among attempted lookups, by classification.
    pub fn failures(&self) -> u64 {
        self.not_found + self.rate_limited + self.transient
    }
}
