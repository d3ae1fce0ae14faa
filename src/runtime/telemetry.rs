use crate::harvest::counters::RunCounters;
use crate::runtime::progress::ProgressTracker;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Spawns a background task that periodically logs lookup throughput and the
/// current counter breakdown until the token is cancelled.
pub fn spawn_metrics_reporter(
    counters: Arc<RunCounters>,
    progress: Arc<ProgressTracker>,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_attempted = counters.attempted();
        let mut last_tick = Instant::now();

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!(target: "tickersweep::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let snapshot = counters.snapshot();
                    let attempted_delta = snapshot.attempted.saturating_sub(last_attempted);
                    let elapsed = last_tick.elapsed().as_secs_f64();
                    let throughput = if elapsed <= f64::EPSILON {
                        0.0
                    } else {
                        attempted_delta as f64 / elapsed
                    };

                    tracing::info!(
                        target: "tickersweep::metrics",
                        throughput = format!("{throughput:.2}"),
                        done = progress.done(),
                        total = progress.total(),
                        succeeded = snapshot.succeeded,
                        not_found = snapshot.not_found,
                        rate_limited = snapshot.rate_limited,
                        transient = snapshot.transient,
                        "harvest metrics snapshot"
                    );

                    last_attempted = snapshot.attempted;
                    last_tick = Instant::now();
                }
            }
        }
    })
}
