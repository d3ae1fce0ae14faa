pub mod harvest;
pub mod report;
pub mod runtime;
pub mod source;

pub use harvest::aggregator::{sort_rows, ResultAggregator};
pub use harvest::breaker::BlockGuard;
pub use harvest::counters::{CountersSnapshot, RunCounters};
pub use harvest::dispatcher::Harvester;
pub use report::sink::{CsvReportSink, ReportSink, REPORT_HEADERS};
pub use report::summary::{format_elapsed, RunSummary};
pub use runtime::config::{HarvestConfig, HarvestConfigBuilder, HarvestConfigParams};
pub use runtime::fatal::FatalErrorHandler;
pub use runtime::runner::Runner;
pub use runtime::telemetry::init_tracing;
pub use source::outcome::{FetchOutcome, RateLimit};
pub use source::provider::{NoopProgress, ProgressObserver, QuoteFetcher};
pub use source::record::{SortColumn, SortKey, StockRecord};
