use crate::runtime::telemetry;
use crate::source::record::SortColumn;
use anyhow::{bail, Context, Result};
use std::time::Duration;

const DEFAULT_POOL_SIZE: usize = 10;
const DEFAULT_BLOCK_TRIP_RATIO: f64 = 0.5;
const DEFAULT_SUCCESS_FLOOR_RATIO: f64 = 0.2;
const DEFAULT_BREAKER_MIN_ATTEMPTS: u64 = 10;

/// Pool sizes past this point noticeably raise the odds of the remote
/// answering with service-unavailable blocks.
const SAFE_POOL_SIZE: usize = 20;

/// Runtime configuration for a harvest run.
///
/// All instances must be constructed via [`HarvestConfig::builder`] or
/// [`HarvestConfig::new`] so invariants are validated before any consumer
/// observes the values. The breaker thresholds are deliberately configuration
/// rather than constants: the values that match a provider's undocumented
/// throttling behaviour can only be found empirically.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    pool_size: usize,
    sort_column: Option<SortColumn>,
    sort_descending: Option<bool>,
    block_trip_ratio: f64,
    success_floor_ratio: f64,
    breaker_min_attempts: u64,
    metrics_interval: Duration,
}

pub struct HarvestConfigParams {
    pub pool_size: usize,
    pub sort_column: Option<SortColumn>,
    pub sort_descending: Option<bool>,
    pub block_trip_ratio: f64,
    pub success_floor_ratio: f64,
    pub breaker_min_attempts: u64,
    pub metrics_interval: Duration,
}

impl HarvestConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// Prefer [`HarvestConfig::builder`] when most values use defaults.
    pub fn new(params: HarvestConfigParams) -> Result<Self> {
        let HarvestConfigParams {
            pool_size,
            sort_column,
            sort_descending,
            block_trip_ratio,
            success_floor_ratio,
            breaker_min_attempts,
            metrics_interval,
        } = params;

        let config = Self {
            pool_size,
            sort_column,
            sort_descending,
            block_trip_ratio,
            success_floor_ratio,
            breaker_min_attempts,
            metrics_interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Number of concurrent workers in the harvest pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Column the final report is sorted by, if any.
    pub fn sort_column(&self) -> Option<SortColumn> {
        self.sort_column
    }

    /// Explicit sort direction override. When unset, the column's own
    /// default applies (descending everywhere except analyst rating).
    pub fn sort_descending(&self) -> Option<bool> {
        self.sort_descending
    }

    /// Share of attempts that may be ambiguous blocks before the guard trips.
    pub fn block_trip_ratio(&self) -> f64 {
        self.block_trip_ratio
    }

    /// Success share below which ambiguous blocks are considered systemic.
    pub fn success_floor_ratio(&self) -> f64 {
        self.success_floor_ratio
    }

    /// Minimum attempts before the ratio conditions are evaluated.
    pub fn breaker_min_attempts(&self) -> u64 {
        self.breaker_min_attempts
    }

    /// Interval used by the metrics reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            bail!("pool_size must be greater than 0");
        }

        if self.pool_size > SAFE_POOL_SIZE {
            tracing::warn!(
                pool_size = self.pool_size,
                safe_pool_size = SAFE_POOL_SIZE,
                "large worker pools raise the chance of the remote blocking this client"
            );
        }

        ensure_ratio(self.block_trip_ratio, "block_trip_ratio")?;
        ensure_ratio(self.success_floor_ratio, "success_floor_ratio")?;

        if self.breaker_min_attempts == 0 {
            bail!("breaker_min_attempts must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct HarvestConfigBuilder {
    pool_size: Option<usize>,
    sort_column: Option<SortColumn>,
    sort_descending: Option<bool>,
    block_trip_ratio: Option<f64>,
    success_floor_ratio: Option<f64>,
    breaker_min_attempts: Option<u64>,
    metrics_interval: Option<Duration>,
}

impl HarvestConfigBuilder {
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    pub fn sort_column(mut self, column: SortColumn) -> Self {
        self.sort_column = Some(column);
        self
    }

    /// Resolves a zero-based value-column index to a sort column, matching
    /// the report layout with the ticker column excluded.
    pub fn sort_column_index(mut self, index: usize) -> Result<Self> {
        let column = SortColumn::from_index(index)
            .with_context(|| format!("no sortable column at index {index}"))?;
        self.sort_column = Some(column);
        Ok(self)
    }

    pub fn sort_descending(mut self, descending: bool) -> Self {
        self.sort_descending = Some(descending);
        self
    }

    pub fn block_trip_ratio(mut self, ratio: f64) -> Self {
        self.block_trip_ratio = Some(ratio);
        self
    }

    pub fn success_floor_ratio(mut self, ratio: f64) -> Self {
        self.success_floor_ratio = Some(ratio);
        self
    }

    pub fn breaker_min_attempts(mut self, attempts: u64) -> Self {
        self.breaker_min_attempts = Some(attempts);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<HarvestConfig> {
        let params = HarvestConfigParams {
            pool_size: self.pool_size.unwrap_or(DEFAULT_POOL_SIZE),
            sort_column: self.sort_column,
            sort_descending: self.sort_descending,
            block_trip_ratio: self.block_trip_ratio.unwrap_or(DEFAULT_BLOCK_TRIP_RATIO),
            success_floor_ratio: self
                .success_floor_ratio
                .unwrap_or(DEFAULT_SUCCESS_FLOOR_RATIO),
            breaker_min_attempts: self
                .breaker_min_attempts
                .unwrap_or(DEFAULT_BREAKER_MIN_ATTEMPTS),
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
        };

        HarvestConfig::new(params)
    }
}

fn ensure_ratio(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        bail!("{field} must be within (0, 1], got {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_valid_defaults() {
        let config = HarvestConfig::builder().build().unwrap();
        assert_eq!(config.pool_size(), DEFAULT_POOL_SIZE);
        assert_eq!(config.sort_column(), None);
        assert_eq!(config.sort_descending(), None);
        assert_eq!(config.block_trip_ratio(), DEFAULT_BLOCK_TRIP_RATIO);
        assert_eq!(config.success_floor_ratio(), DEFAULT_SUCCESS_FLOOR_RATIO);
        assert_eq!(config.breaker_min_attempts(), DEFAULT_BREAKER_MIN_ATTEMPTS);
        assert_eq!(
            config.metrics_interval(),
            telemetry::DEFAULT_METRICS_INTERVAL
        );
    }

    #[test]
    fn sort_column_index_resolves_like_the_report_layout() {
        let config = HarvestConfig::builder()
            .sort_column_index(14)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.sort_column(), Some(SortColumn::Rating));

        let err = HarvestConfig::builder().sort_column_index(99).unwrap_err();
        assert!(format!("{err}").contains("no sortable column"));
    }

    #[test]
    fn validation_catches_invalid_values() {
        let err = HarvestConfig::builder().pool_size(0).build().unwrap_err();
        assert!(format!("{err}").contains("pool_size"));

        let err = HarvestConfig::builder()
            .block_trip_ratio(0.0)
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("block_trip_ratio"));

        let err = HarvestConfig::builder()
            .success_floor_ratio(1.5)
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("success_floor_ratio"));

        let err = HarvestConfig::builder()
            .breaker_min_attempts(0)
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("breaker_min_attempts"));

        let err = HarvestConfig::builder()
            .metrics_interval(Duration::from_secs(0))
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("metrics_interval"));
    }

    #[test]
    fn direct_constructor_runs_validation() {
        let err = HarvestConfig::new(HarvestConfigParams {
            pool_size: 0,
            sort_column: None,
            sort_descending: None,
            block_trip_ratio: DEFAULT_BLOCK_TRIP_RATIO,
            success_floor_ratio: DEFAULT_SUCCESS_FLOOR_RATIO,
            breaker_min_attempts: DEFAULT_BREAKER_MIN_ATTEMPTS,
            metrics_interval: telemetry::DEFAULT_METRICS_INTERVAL,
        })
        .unwrap_err();

        assert!(format!("{err}").contains("pool_size"));
    }

    #[test]
    fn overrides_are_preserved() {
        let config = HarvestConfig::builder()
            .pool_size(5)
            .sort_column(SortColumn::MarketCap)
            .sort_descending(false)
            .block_trip_ratio(0.7)
            .success_floor_ratio(0.1)
            .breaker_min_attempts(25)
            .metrics_interval(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.pool_size(), 5);
        assert_eq!(config.sort_column(), Some(SortColumn::MarketCap));
        assert_eq!(config.sort_descending(), Some(false));
        assert_eq!(config.block_trip_ratio(), 0.7);
        assert_eq!(config.success_floor_ratio(), 0.1);
        assert_eq!(config.breaker_min_attempts(), 25);
        assert_eq!(config.metrics_interval(), Duration::from_secs(30));
    }
}
