//! The concurrent harvesting engine, split across focused submodules:
//! - `counters`: atomic per-run tallies shared by every worker
//! - `breaker`: adaptive block guard that halts dispatch on systemic denial
//! - `aggregator`: thread-safe insertion-ordered result accumulation and sort
//! - `worker`: claim/fetch/classify loop run by each pool member
//! - `dispatcher`: pool creation, cancellation wiring, and panic capture

pub mod aggregator;
pub mod breaker;
pub mod counters;
pub mod dispatcher;
pub(crate) mod worker;

pub use aggregator::{sort_rows, ResultAggregator};
pub use breaker::BlockGuard;
pub use counters::{CountersSnapshot, RunCounters};
pub use dispatcher::Harvester;
