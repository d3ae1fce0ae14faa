//! Typed per-ticker record and the spreadsheet column model used for sorting.

use serde::Serialize;

/// Fixed-shape result of one successful ticker lookup.
///
/// Every field is optional: providers routinely return partial data for thinly
/// traded entities, and a record with at least a name is still worth keeping.
/// Immutable once inserted into the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StockRecord {
    pub name: Option<String>,
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub price: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub dividend_yield_5y: Option<f64>,
    pub profit_margin: Option<f64>,
    pub industry: Option<String>,
    pub employees: Option<u64>,
    pub rating: Option<f64>,
}

/// Report columns a run can be sorted by. Mirrors the spreadsheet layout with
/// the ticker column excluded (the ticker is the key, not a value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortColumn {
    Name,
    MarketCap,
    DividendYield,
    PeRatio,
    PbRatio,
    Price,
    DayHigh,
    DayLow,
    Week52High,
    Week52Low,
    DividendYield5y,
    ProfitMargin,
    Industry,
    Employees,
    Rating,
}

impl SortColumn {
    /// Resolves a zero-based value-column index (ticker excluded) to a column.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Name),
            1 => Some(Self::MarketCap),
            2 => Some(Self::DividendYield),
            3 => Some(Self::PeRatio),
            4 => Some(Self::PbRatio),
            5 => Some(Self::Price),
            6 => Some(Self::DayHigh),
            7 => Some(Self::DayLow),
            8 => Some(Self::Week52High),
            9 => Some(Self::Week52Low),
            10 => Some(Self::DividendYield5y),
            11 => Some(Self::ProfitMargin),
            12 => Some(Self::Industry),
            13 => Some(Self::Employees),
            14 => Some(Self::Rating),
            _ => None,
        }
    }

    /// Header text used in the report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Stock Name",
            Self::MarketCap => "Market Capital",
            Self::DividendYield => "Dividend Yield",
            Self::PeRatio => "PE Ratio",
            Self::PbRatio => "PB Ratio",
            Self::Price => "Current Price",
            Self::DayHigh => "Today's High",
            Self::DayLow => "Today's Low",
            Self::Week52High => "52W High",
            Self::Week52Low => "52W Low",
            Self::DividendYield5y => "5Y Dividend Yield",
            Self::ProfitMargin => "Profit Margin",
            Self::Industry => "Industry",
            Self::Employees => "Employees",
            Self::Rating => "Rating",
        }
    }

    /// Analyst ratings score 1 (strong buy) to 5 (sell), so the natural read
    /// for `Rating` is ascending. Everything else reads best-first descending.
    pub fn ascending_by_default(&self) -> bool {
        matches!(self, Self::Rating)
    }

    /// Extracts this column's sort key from a record. Missing values coerce
    /// to zero (numeric columns) or the empty string (text columns) so they
    /// collect at the bottom of a descending sort instead of being dropped.
    pub fn key(&self, record: &StockRecord) -> SortKey {
        match self {
            Self::Name => SortKey::text(record.name.as_deref()),
            Self::MarketCap => SortKey::number(record.market_cap),
            Self::DividendYield => SortKey::number(record.dividend_yield),
            Self::PeRatio => SortKey::number(record.pe_ratio),
            Self::PbRatio => SortKey::number(record.pb_ratio),
            Self::Price => SortKey::number(record.price),
            Self::DayHigh => SortKey::number(record.day_high),
            Self::DayLow => SortKey::number(record.day_low),
            Self::Week52High => SortKey::number(record.week52_high),
            Self::Week52Low => SortKey::number(record.week52_low),
            Self::DividendYield5y => SortKey::number(record.dividend_yield_5y),
            Self::ProfitMargin => SortKey::number(record.profit_margin),
            Self::Industry => SortKey::text(record.industry.as_deref()),
            Self::Employees => SortKey::number(record.employees.map(|count| count as f64)),
            Self::Rating => SortKey::number(record.rating),
        }
    }
}

/// Totally ordered sort key. A single column always yields one variant, but
/// the ordering is defined across variants so sorting stays total regardless.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn number(value: Option<f64>) -> Self {
        Self::Number(value.unwrap_or(0.0))
    }

    fn text(value: Option<&str>) -> Self {
        Self::Text(value.unwrap_or_default().to_owned())
    }
}

impl Eq for SortKey {}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.total_cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(_), Self::Text(_)) => std::cmp::Ordering::Less,
            (Self::Text(_), Self::Number(_)) => std::cmp::Ordering::Greater,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Compacts large counts into `K`/`M`/`B`/`T` suffixed strings for report
/// cells (market capital, employee counts).
pub fn humanize_count(value: f64) -> String {
    const SCALES: [(f64, &str); 4] = [
        (1e12, "T"),
        (1e9, "B"),
        (1e6, "M"),
        (1e3, "K"),
    ];

    let magnitude = value.abs();
    for (scale, suffix) in SCALES {
        if magnitude >= scale {
            let scaled = value / scale;
            let mut text = format!("{scaled:.2}");
            while text.ends_with('0') {
                text.pop();
            }
            if text.ends_with('.') {
                text.pop();
            }
            return format!("{text}{suffix}");
        }
    }

    let mut text = format!("{value:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
