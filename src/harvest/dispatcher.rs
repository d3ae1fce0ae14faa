//! Worker pool orchestration for the harvest engine.
//!
//! `Harvester` owns the shared run state (counters, aggregator, block guard,
//! fatal handler), fans the ticker universe out over a fixed pool of worker
//! tasks, and drains the pool on completion, cancellation, or breaker trip.
//! A worker panic is converted into a fatal error rather than a hang.

use crate::harvest::aggregator::ResultAggregator;
use crate::harvest::breaker::BlockGuard;
use crate::harvest::counters::RunCounters;
use crate::harvest::worker::Worker;
use crate::runtime::config::HarvestConfig;
use crate::runtime::fatal::FatalErrorHandler;
use crate::runtime::progress::ProgressTracker;
use crate::runtime::telemetry;
use crate::source::provider::{ProgressObserver, QuoteFetcher};
use anyhow::{anyhow, Result};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Harvester {
    config: HarvestConfig,
    fetcher: Arc<dyn QuoteFetcher>,
    observer: Arc<dyn ProgressObserver>,
    counters: Arc<RunCounters>,
    aggregator: Arc<ResultAggregator>,
    breaker: Arc<BlockGuard>,
    fatal_handler: Arc<FatalErrorHandler>,
    run_token: CancellationToken,
}

impl Harvester {
    /// Creates a harvester with its own root cancellation token. Use
    /// [`Self::with_cancellation_token`] to integrate with an existing
    /// shutdown mechanism.
    pub fn new(
        config: HarvestConfig,
        fetcher: Arc<dyn QuoteFetcher>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self::with_cancellation_token(config, fetcher, observer, CancellationToken::new())
    }

    pub fn with_cancellation_token(
        config: HarvestConfig,
        fetcher: Arc<dyn QuoteFetcher>,
        observer: Arc<dyn ProgressObserver>,
        shutdown_root: CancellationToken,
    ) -> Self {
        let run_token = shutdown_root.child_token();
        let counters = Arc::new(RunCounters::default());
        let breaker = Arc::new(BlockGuard::new(
            Arc::clone(&counters),
            run_token.clone(),
            config.block_trip_ratio(),
            config.success_floor_ratio(),
            config.breaker_min_attempts(),
        ));
        let fatal_handler = Arc::new(FatalErrorHandler::new(shutdown_root, run_token.clone()));

        Self {
            config,
            fetcher,
            observer,
            counters,
            aggregator: Arc::new(ResultAggregator::new()),
            breaker,
            fatal_handler,
            run_token,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn counters(&self) -> Arc<RunCounters> {
        Arc::clone(&self.counters)
    }

    pub fn aggregator(&self) -> Arc<ResultAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn breaker(&self) -> Arc<BlockGuard> {
        Arc::clone(&self.breaker)
    }

    pub fn fatal_handler(&self) -> Arc<FatalErrorHandler> {
        Arc::clone(&self.fatal_handler)
    }

    /// Stops submitting new lookups; in-flight lookups finish naturally.
    pub fn cancel(&self) {
        self.run_token.cancel();
    }

    pub fn run_token(&self) -> CancellationToken {
        self.run_token.clone()
    }

    /// Runs the fetch collaborator over every ticker with at most
    /// `pool_size` lookups in flight. Returns once all tickers have been
    /// attempted or the run was cancelled; returns an error only when a
    /// fatal condition was captured.
    pub async fn dispatch(&self, tickers: Vec<String>) -> Result<()> {
        let total = tickers.len();
        if total == 0 {
            tracing::info!("no tickers to harvest");
            return Ok(());
        }

        let pool_size = self.config.pool_size().min(total);
        tracing::info!(total, pool_size, "dispatching ticker universe to worker pool");

        let tickers: Arc<[String]> = Arc::from(tickers);
        let cursor = Arc::new(AtomicUsize::new(0));
        let progress = Arc::new(ProgressTracker::new(total, Arc::clone(&self.observer)));

        let metrics_token = self.run_token.child_token();
        let metrics_handle = telemetry::spawn_metrics_reporter(
            Arc::clone(&self.counters),
            Arc::clone(&progress),
            metrics_token.clone(),
            self.config.metrics_interval(),
        );

        let mut handles = Vec::with_capacity(pool_size);
        for worker_id in 0..pool_size {
            let worker = Worker {
                id: worker_id,
                fetcher: Arc::clone(&self.fetcher),
                tickers: Arc::clone(&tickers),
                cursor: Arc::clone(&cursor),
                aggregator: Arc::clone(&self.aggregator),
                counters: Arc::clone(&self.counters),
                breaker: Arc::clone(&self.breaker),
                progress: Arc::clone(&progress),
                fatal_handler: Arc::clone(&self.fatal_handler),
                shutdown: self.run_token.clone(),
            };

            let fatal_handler = Arc::clone(&self.fatal_handler);
            let worker_shutdown = self.run_token.clone();
            let handle = tokio::spawn(async move {
                let result = std::panic::AssertUnwindSafe(worker.run())
                    .catch_unwind()
                    .await;

                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::error!(
                            worker = worker_id,
                            error = %err,
                            "worker task exited with error"
                        );
                        let context = format!("worker {worker_id} exited with error");
                        fatal_handler.trigger(&context, err);
                        worker_shutdown.cancel();
                    }
                    Err(panic_payload) => {
                        let panic_msg = panic_message(panic_payload.as_ref());
                        tracing::error!(
                            worker = worker_id,
                            panic = %panic_msg,
                            "worker task panicked"
                        );
                        let context = format!("worker {worker_id} panicked");
                        let panic_error = anyhow!("worker {worker_id} panicked: {panic_msg}");
                        fatal_handler.trigger(&context, panic_error);
                        worker_shutdown.cancel();
                    }
                }
            });
            handles.push(handle);
        }

        join_all(handles).await;
        metrics_token.cancel();
        let _ = metrics_handle.await;

        if let Some(error) = self.fatal_handler.error() {
            return Err(error);
        }

        tracing::info!(
            attempted = self.counters.attempted(),
            harvested = self.aggregator.len(),
            cancelled = self.run_token.is_cancelled(),
            "dispatch drained"
        );
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
