//! Finalization surface: the report sink contract with its CSV
//! implementation, plus the run summary and elapsed-time formatting.

pub mod sink;
pub mod summary;

pub use sink::{CsvReportSink, ReportSink, REPORT_HEADERS};
pub use summary::{format_elapsed, RunSummary};
