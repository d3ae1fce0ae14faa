use crate::harvest::aggregator::sort_rows;
use crate::harvest::dispatcher::Harvester;
use crate::report::sink::ReportSink;
use crate::report::summary::RunSummary;
use crate::runtime::config::HarvestConfig;
use crate::source::provider::{ProgressObserver, QuoteFetcher};
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Coordinates a complete harvest run: dispatch, optional sort, report
/// serialization, and the closing summary.
///
/// Finalization is structurally exactly-once: `run` consumes the runner, and
/// every termination path (completion, manual interrupt, block-guard trip,
/// fatal error) flows through the same flush-and-summarize step. Only a fatal
/// error turns the result into `Err`; interrupts and guard trips finish
/// cleanly with partial data.
pub struct Runner {
    harvester: Harvester,
    sink: Box<dyn ReportSink + Send>,
    shutdown: CancellationToken,
}

impl Runner {
    /// Creates a runner and wires a root [`CancellationToken`] that
    /// propagates through the dispatcher, workers, and metrics reporter.
    pub fn new(
        config: HarvestConfig,
        fetcher: Arc<dyn QuoteFetcher>,
        observer: Arc<dyn ProgressObserver>,
        sink: Box<dyn ReportSink + Send>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let harvester =
            Harvester::with_cancellation_token(config, fetcher, observer, shutdown.clone());
        Self {
            harvester,
            sink,
            shutdown,
        }
    }

    /// Returns a clone of the root shutdown token so external callers can
    /// integrate with their own signal handlers or cancellation strategies.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Harvests the given tickers to completion (or cancellation) and
    /// finalizes the report.
    pub async fn run(self, tickers: Vec<String>) -> Result<RunSummary> {
        let started = Instant::now();
        let submitted = tickers.len();
        let dispatch_result = self.harvester.dispatch(tickers).await;
        self.finalize(started, submitted, dispatch_result)
    }

    /// Like [`Self::run`], but treats Ctrl-C (SIGINT) as a manual interrupt:
    /// dispatch stops submitting, in-flight lookups drain, and whatever was
    /// harvested is flushed before returning cleanly.
    pub async fn run_until_ctrl_c(self, tickers: Vec<String>) -> Result<RunSummary> {
        let started = Instant::now();
        let submitted = tickers.len();

        let dispatch_result = {
            let dispatch = self.harvester.dispatch(tickers);
            tokio::pin!(dispatch);

            tokio::select! {
                result = &mut dispatch => result,
                _ = signal::ctrl_c() => {
                    tracing::warn!("manual interrupt received; draining in-flight lookups");
                    self.harvester.cancel();
                    dispatch.await
                }
            }
        };

        self.finalize(started, submitted, dispatch_result)
    }

    fn finalize(
        mut self,
        started: Instant,
        submitted: usize,
        dispatch_result: Result<()>,
    ) -> Result<RunSummary> {
        let counters = self.harvester.counters().snapshot();
        let mut rows = self.harvester.aggregator().snapshot();

        if let Some(column) = self.harvester.config().sort_column() {
            let descending = self
                .harvester
                .config()
                .sort_descending()
                .unwrap_or(!column.ascending_by_default());
            tracing::info!(column = column.label(), descending, "sorting report");
            sort_rows(&mut rows, column, descending);
        }

        let mut output = None;
        if !rows.is_empty() {
            for (index, (ticker, record)) in rows.iter().enumerate() {
                self.sink.append_row(index + 1, ticker, record)?;
            }
            output = Some(self.sink.close()?);
        }

        let summary = RunSummary::new(submitted, rows.len(), &counters, started.elapsed(), output);
        summary.log();

        dispatch_result.map(|()| summary)
    }
}
