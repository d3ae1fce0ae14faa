//! Report sink contract and the CSV implementation used by default.

use crate::source::record::{humanize_count, StockRecord};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Column headers of the generated report, ticker first.
pub const REPORT_HEADERS: [&str; 16] = [
    "Stock Ticker",
    "Stock Name",
    "Market Capital",
    "Dividend Yield",
    "PE Ratio",
    "PB Ratio",
    "Current Price",
    "Today's High",
    "Today's Low",
    "52W High",
    "52W Low",
    "5Y Dividend Yield",
    "Profit Margin",
    "Industry",
    "Employees",
    "Rating",
];

/// Serializes the aggregated rows to durable storage. Called only from the
/// single-threaded finalization phase, never concurrently. `row_index` is
/// 1-based; row 0 is the header.
pub trait ReportSink {
    fn append_row(&mut self, row_index: usize, ticker: &str, record: &StockRecord) -> Result<()>;

    /// Flushes buffered rows and returns the path the report was stored at.
    fn close(&mut self) -> Result<PathBuf>;
}

/// CSV report writer with a timestamped default filename.
pub struct CsvReportSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvReportSink {
    /// Creates the file at `path` and writes the header row.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let file = File::create(&path)
            .with_context(|| format!("failed to create report at {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(REPORT_HEADERS)
            .context("failed to write report header")?;

        Ok(Self { writer, path })
    }

    /// Creates a report named `stocks_<HH-MM_DD-MM-YYYY>.csv` under `dir`.
    pub fn with_timestamped_name(dir: impl AsRef<Path>) -> Result<Self> {
        let filename = chrono::Local::now()
            .format("stocks_%H-%M_%d-%m-%Y.csv")
            .to_string();
        Self::create(dir.as_ref().join(filename))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for CsvReportSink {
    fn append_row(&mut self, _row_index: usize, ticker: &str, record: &StockRecord) -> Result<()> {
        self.writer
            .write_record(row_cells(ticker, record))
            .with_context(|| format!("failed to write report row for {ticker}"))
    }

    fn close(&mut self) -> Result<PathBuf> {
        self.writer.flush().context("failed to flush report")?;
        Ok(self.path.clone())
    }
}

fn row_cells(ticker: &str, record: &StockRecord) -> Vec<String> {
    vec![
        ticker.to_owned(),
        text_cell(record.name.as_deref()),
        count_cell(record.market_cap),
        float_cell(record.dividend_yield),
        float_cell(record.pe_ratio),
        float_cell(record.pb_ratio),
        float_cell(record.price),
        float_cell(record.day_high),
        float_cell(record.day_low),
        float_cell(record.week52_high),
        float_cell(record.week52_low),
        float_cell(record.dividend_yield_5y),
        float_cell(record.profit_margin),
        text_cell(record.industry.as_deref()),
        count_cell(record.employees.map(|count| count as f64)),
        float_cell(record.rating),
    ]
}

fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

fn float_cell(value: Option<f64>) -> String {
    value.map(|number| format!("{number:.2}")).unwrap_or_default()
}

fn count_cell(value: Option<f64>) -> String {
    value.map(humanize_count).unwrap_or_default()
}
