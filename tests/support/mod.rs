//! Shared test doubles: a scripted fetch collaborator, an in-memory report
//! sink, and a counting progress observer.

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tickersweep::{
    FetchOutcome, ProgressObserver, QuoteFetcher, RateLimit, ReportSink, StockRecord,
};

/// Outcome script for one ticker. Defaults to `Success` for unscripted
/// tickers.
#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    Success,
    NotFound,
    RateLimited(u16),
    Transient,
    Fatal,
}

/// Fetch collaborator that replays scripted outcomes, optionally delaying
/// each lookup to keep cancellation windows open.
pub struct ScriptedFetcher {
    scripts: HashMap<String, Scripted>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(scripts: HashMap<String, Scripted>) -> Self {
        Self {
            scripts,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QuoteFetcher for ScriptedFetcher {
    fn fetch_one<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, FetchOutcome> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.scripts.get(ticker).copied() {
                Some(Scripted::Success) | None => FetchOutcome::Success(sample_record(ticker)),
                Some(Scripted::NotFound) => FetchOutcome::NotFound,
                Some(Scripted::RateLimited(status)) => FetchOutcome::RateLimited(RateLimit::new(
                    status,
                    format!("https://finance.example.com/quote/{ticker}"),
                    "refused",
                )),
                Some(Scripted::Transient) => FetchOutcome::Transient(anyhow!("connection reset")),
                Some(Scripted::Fatal) => FetchOutcome::Fatal(anyhow!("provider state corrupted")),
            }
        })
    }
}

pub fn sample_record(ticker: &str) -> StockRecord {
    // derive a distinct price from the ticker's trailing digits so sorted
    // reports have a meaningful order to assert on
    let suffix: u32 = ticker
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0);
    StockRecord {
        name: Some(format!("{ticker} Corp")),
        price: Some(10.0 + f64::from((suffix * 37) % 100)),
        ..StockRecord::default()
    }
}

/// Sink that records appended rows in memory and counts close calls.
pub struct MemorySink {
    rows: Arc<Mutex<Vec<(usize, String, StockRecord)>>>,
    closes: Arc<AtomicUsize>,
}

/// Handle to inspect a [`MemorySink`] after the runner has consumed it.
#[derive(Clone)]
pub struct MemorySinkHandle {
    rows: Arc<Mutex<Vec<(usize, String, StockRecord)>>>,
    closes: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> (Self, MemorySinkHandle) {
        let rows = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));
        let handle = MemorySinkHandle {
            rows: Arc::clone(&rows),
            closes: Arc::clone(&closes),
        };
        (Self { rows, closes }, handle)
    }
}

impl ReportSink for MemorySink {
    fn append_row(&mut self, row_index: usize, ticker: &str, record: &StockRecord) -> Result<()> {
        self.rows
            .lock()
            .expect("sink rows mutex poisoned")
            .push((row_index, ticker.to_owned(), record.clone()));
        Ok(())
    }

    fn close(&mut self) -> Result<PathBuf> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(PathBuf::from("memory://report"))
    }
}

impl MemorySinkHandle {
    pub fn rows(&self) -> Vec<(usize, String, StockRecord)> {
        self.rows.lock().expect("sink rows mutex poisoned").clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Observer that tracks the highest completion count it was told about.
#[derive(Default)]
pub struct CountingObserver {
    pub max_done: AtomicUsize,
    pub total: AtomicUsize,
    pub updates: AtomicUsize,
}

impl ProgressObserver for CountingObserver {
    fn on_progress(&self, done: usize, total: usize) {
        self.max_done.fetch_max(done, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
        self.updates.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds `count` distinct tickers named `TK000`, `TK001`, ...
pub fn tickers(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("TK{index:03}")).collect()
}
