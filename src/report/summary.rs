//! End-of-run accounting: the summary handed back to callers and the
//! human-readable elapsed-time format used in closing log lines.

use crate::harvest::counters::CountersSnapshot;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Final accounting for a harvest run, produced exactly once after dispatch
/// has fully stopped, whether it completed, was interrupted, or was halted by
/// the block guard.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Tickers handed to the dispatcher.
    pub submitted: usize,
    /// Rows that made it into the report.
    pub analyzed: usize,
    /// Submitted minus analyzed; includes tickers never attempted when the
    /// run stopped early.
    pub failed: usize,
    pub not_found: u64,
    pub rate_limited: u64,
    pub transient: u64,
    pub breaker_tripped: bool,
    #[serde(skip)]
    pub elapsed: Duration,
    pub output: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(
        submitted: usize,
        analyzed: usize,
        counters: &CountersSnapshot,
        elapsed: Duration,
        output: Option<PathBuf>,
    ) -> Self {
        Self {
            submitted,
            analyzed,
            failed: submitted.saturating_sub(analyzed),
            not_found: counters.not_found,
            rate_limited: counters.rate_limited,
            transient: counters.transient,
            breaker_tripped: counters.breaker_tripped,
            elapsed,
            output,
        }
    }

    /// Emits the closing log lines. Totals always appear; the failure
    /// breakdown and stored path only when non-trivial.
    pub fn log(&self) {
        tracing::info!(total = self.submitted, "total tickers instantiated");
        tracing::info!(analyzed = self.analyzed, "total tickers analyzed");
        tracing::info!(failed = self.failed, "total tickers failed to analyze");

        if self.not_found > 0 || self.rate_limited > 0 || self.transient > 0 {
            tracing::info!(
                not_found = self.not_found,
                rate_limited = self.rate_limited,
                transient = self.transient,
                "failure breakdown"
            );
        }

        if self.breaker_tripped {
            tracing::warn!("run was halted early by the block guard; report holds partial data");
        }

        tracing::info!(
            elapsed = %format_elapsed(self.elapsed.as_secs()),
            "total execution time"
        );

        if let Some(path) = &self.output {
            tracing::info!(path = %path.display(), "report stored");
        }
    }
}

/// Converts whole seconds to `H hours M minutes S seconds`, omitting leading
/// zero-valued units: `45` becomes "45 seconds", `125` becomes
/// "2 minutes 5 seconds", `3725` becomes "1 hours 2 minutes 5 seconds".
pub fn format_elapsed(seconds: u64) -> String {
    let seconds = seconds % (24 * 3600);
    let hours = seconds / 3600;
    let seconds = seconds % 3600;
    let minutes = seconds / 60;
    let seconds = seconds % 60;

    if hours > 0 {
        format!("{hours} hours {minutes} minutes {seconds} seconds")
    } else if minutes > 0 {
        format!("{minutes} minutes {seconds} seconds")
    } else {
        format!("{seconds} seconds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CountersSnapshot {
        CountersSnapshot {
            attempted: 26,
            succeeded: 20,
            not_found: 4,
            rate_limited: 2,
            transient: 0,
            breaker_tripped: false,
        }
    }

    #[test]
    fn seconds_only() {
        assert_eq!(format_elapsed(45), "45 seconds");
        assert_eq!(format_elapsed(0), "0 seconds");
        assert_eq!(format_elapsed(59), "59 seconds");
    }

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_elapsed(125), "2 minutes 5 seconds");
        assert_eq!(format_elapsed(60), "1 minutes 0 seconds");
    }

    #[test]
    fn hours_minutes_seconds() {
        assert_eq!(format_elapsed(3725), "1 hours 2 minutes 5 seconds");
        assert_eq!(format_elapsed(3600), "1 hours 0 minutes 0 seconds");
    }

    #[test]
    fn wraps_at_a_full_day() {
        assert_eq!(format_elapsed(24 * 3600 + 45), "45 seconds");
    }

    #[test]
    fn failed_is_submitted_minus_analyzed() {
        let summary = RunSummary::new(26, 20, &snapshot(), Duration::from_secs(45), None);
        assert_eq!(summary.failed, 6);
        assert_eq!(summary.rate_limited, 2);
        assert!(!summary.breaker_tripped);
    }

    #[test]
    fn serializes_without_elapsed() {
        let summary = RunSummary::new(26, 20, &snapshot(), Duration::from_secs(45), None);
        let json = serde_json::to_value(&summary).expect("summary serializes");
        assert_eq!(json["submitted"], 26);
        assert_eq!(json["analyzed"], 20);
        assert!(json.get("elapsed").is_none());
    }
}
