//! Collaborator-facing contracts and data model: the typed per-ticker record,
//! fetch outcome classification, and the traits implemented by lookup
//! providers and progress observers.

pub mod outcome;
pub mod provider;
pub mod record;

pub use outcome::{FetchOutcome, RateLimit};
pub use provider::{NoopProgress, ProgressObserver, QuoteFetcher};
pub use record::{SortColumn, SortKey, StockRecord};
