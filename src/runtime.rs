//! Run-scoped scaffolding: validated configuration, lifecycle coordination,
//! fatal error capture, progress tracking, and telemetry.

pub mod config;
pub mod fatal;
pub mod progress;
pub mod runner;
pub mod telemetry;

pub use config::{HarvestConfig, HarvestConfigBuilder, HarvestConfigParams};
pub use fatal::FatalErrorHandler;
pub use progress::ProgressTracker;
pub use runner::Runner;
pub use telemetry::{init_tracing, DEFAULT_METRICS_INTERVAL};
