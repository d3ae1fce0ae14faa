//! The claim/fetch/classify loop executed by each pool member.

use crate::harvest::aggregator::ResultAggregator;
use crate::harvest::breaker::BlockGuard;
use crate::harvest::counters::RunCounters;
use crate::runtime::fatal::FatalErrorHandler;
use crate::runtime::progress::ProgressTracker;
use crate::source::outcome::FetchOutcome;
use crate::source::provider::QuoteFetcher;
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One member of the harvest pool. Workers share a single atomic cursor over
/// the ticker slice, so each ticker is claimed exactly once; a worker that
/// sees the cursor past the end, or the run token cancelled, exits.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) fetcher: Arc<dyn QuoteFetcher>,
    pub(crate) tickers: Arc<[String]>,
    pub(crate) cursor: Arc<AtomicUsize>,
    pub(crate) aggregator: Arc<ResultAggregator>,
    pub(crate) counters: Arc<RunCounters>,
    pub(crate) breaker: Arc<BlockGuard>,
    pub(crate) progress: Arc<ProgressTracker>,
    pub(crate) fatal_handler: Arc<FatalErrorHandler>,
    pub(crate) shutdown: CancellationToken,
}

impl Worker {
    #[tracing::instrument(name = "worker", skip_all, fields(worker = self.id))]
    pub(crate) async fn run(self) -> Result<()> {
        tracing::debug!(worker = self.id, "worker task started");

        loop {
            if self.shutdown.is_cancelled() {
                tracing::debug!(worker = self.id, "shutdown requested; exiting worker loop");
                break;
            }

            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(ticker) = self.tickers.get(index) else {
                break;
            };

            self.counters.record_attempt();
            let outcome = self.fetcher.fetch_one(ticker).await;
            tracing::trace!(ticker, outcome = outcome.kind(), "lookup resolved");
            self.classify(ticker, outcome);

            if self.fatal_handler.is_triggered() {
                break;
            }

            self.progress.record_completed();
        }

        Ok(())
    }

    fn classify(&self, ticker: &str, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Success(record) => {
                if self.aggregator.insert(ticker, record) {
                    self.counters.record_success();
                } else {
                    // should not happen under correct dispatch; first insert stays
                    tracing::warn!(ticker, "duplicate record ignored; keeping first insert");
                }
            }
            FetchOutcome::NotFound => {
                self.counters.record_not_found();
                tracing::debug!(ticker, "no usable data for ticker");
            }
            FetchOutcome::RateLimited(limit) => {
                self.counters.record_rate_limited();
                tracing::debug!(
                    ticker,
                    status = limit.status,
                    url = %limit.url,
                    reason = %limit.reason,
                    "lookup refused by remote"
                );
                if self.breaker.observe_rate_limited(&limit) {
                    tracing::warn!(
                        worker = self.id,
                        ticker,
                        "block guard tripped; no further tickers will be submitted"
                    );
                }
            }
            FetchOutcome::Transient(error) => {
                self.counters.record_transient();
                tracing::debug!(ticker, error = %error, "transient failure");
            }
            FetchOutcome::Fatal(error) => {
                let context = format!("lookup for {ticker} reported a fatal condition");
                self.fatal_handler.trigger(&context, error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::outcome::RateLimit;
    use crate::source::provider::NoopProgress;
    use crate::source::record::StockRecord;
    use anyhow::anyhow;
    use futures::future::BoxFuture;
    use std::collections::HashMap;

    enum Scripted {
        Success,
        NotFound,
        RateLimited(u16),
        Transient,
        Fatal,
    }

    struct ScriptFetcher {
        scripts: HashMap<String, Scripted>,
    }

    impl QuoteFetcher for ScriptFetcher {
        fn fetch_one<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, FetchOutcome> {
            Box::pin(async move {
                match self.scripts.get(ticker) {
                    Some(Scripted::Success) | None => FetchOutcome::Success(StockRecord {
                        name: Some(ticker.to_owned()),
                        ..StockRecord::default()
                    }),
                    Some(Scripted::NotFound) => FetchOutcome::NotFound,
                    Some(Scripted::RateLimited(status)) => {
                        FetchOutcome::RateLimited(RateLimit::new(
                            *status,
                            format!("https://finance.example.com/quote/{ticker}"),
                            "refused",
                        ))
                    }
                    Some(Scripted::Transient) => {
                        FetchOutcome::Transient(anyhow!("connection reset"))
                    }
                    Some(Scripted::Fatal) => FetchOutcome::Fatal(anyhow!("corrupted state")),
                }
            })
        }
    }

    fn worker_over(tickers: &[&str], scripts: HashMap<String, Scripted>) -> (Worker, Arc<RunCounters>, Arc<ResultAggregator>) {
        let counters = Arc::new(RunCounters::default());
        let aggregator = Arc::new(ResultAggregator::new());
        let run_token = CancellationToken::new();
        let breaker = Arc::new(BlockGuard::new(
            Arc::clone(&counters),
            run_token.clone(),
            0.5,
            0.2,
            10,
        ));
        let tickers: Arc<[String]> = tickers.iter().map(|t| t.to_string()).collect();
        let total = tickers.len();
        let worker = Worker {
            id: 0,
            fetcher: Arc::new(ScriptFetcher { scripts }),
            tickers,
            cursor: Arc::new(AtomicUsize::new(0)),
            aggregator: Arc::clone(&aggregator),
            counters: Arc::clone(&counters),
            breaker,
            progress: Arc::new(ProgressTracker::new(total, Arc::new(NoopProgress))),
            fatal_handler: Arc::new(FatalErrorHandler::new(
                CancellationToken::new(),
                run_token.clone(),
            )),
            shutdown: run_token,
        };
        (worker, counters, aggregator)
    }

    #[tokio::test]
    async fn attempts_every_ticker_once() {
        let mut scripts = HashMap::new();
        scripts.insert("BBBB".to_owned(), Scripted::NotFound);
        scripts.insert("CCCC".to_owned(), Scripted::Transient);
        let (worker, counters, aggregator) = worker_over(&["AAAA", "BBBB", "CCCC"], scripts);

        worker.run().await.expect("worker must not error");

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.attempted, 3);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.transient, 1);
        assert_eq!(aggregator.len(), 1);
    }

    #[tokio::test]
    async fn fatal_outcome_stops_the_loop() {
        let mut scripts = HashMap::new();
        scripts.insert("BBBB".to_owned(), Scripted::Fatal);
        let (worker, counters, _) = worker_over(&["AAAA", "BBBB", "CCCC", "DDDD"], scripts);
        let fatal = worker.fatal_handler.clone();

        worker.run().await.expect("worker must not error");

        assert!(fatal.is_triggered());
        // AAAA and BBBB were attempted, CCCC/DDDD remain unprocessed
        assert_eq!(counters.attempted(), 2);
    }

    #[tokio::test]
    async fn hard_block_cancels_remaining_work() {
        let mut scripts = HashMap::new();
        scripts.insert("BBBB".to_owned(), Scripted::RateLimited(503));
        let (worker, counters, aggregator) = worker_over(&["AAAA", "BBBB", "CCCC", "DDDD"], scripts);

        worker.run().await.expect("worker must not error");

        let snapshot = counters.snapshot();
        assert!(snapshot.breaker_tripped);
        assert_eq!(snapshot.attempted, 2);
        // the row harvested before the trip survives
        assert_eq!(aggregator.len(), 1);
    }
}
