//! Thread-safe accumulation of successful lookups and the explicit sort
//! applied before reporting.

use crate::source::record::{SortColumn, StockRecord};
use std::collections::HashSet;
use std::sync::Mutex;

/// Insertion-ordered mapping from ticker to record.
///
/// Concurrent workers each insert at most one record for their own ticker;
/// the single mutex makes every insert atomic so no partial row is ever
/// observable. Duplicate inserts for the same ticker are ignored: the first
/// writer wins, and the row order stays the first-success order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: Mutex<AggregatorInner>,
}

#[derive(Debug, Default)]
struct AggregatorInner {
    rows: Vec<(String, StockRecord)>,
    seen: HashSet<String>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, returning `false` when the ticker was already
    /// present (the existing record is kept untouched).
    pub fn insert(&self, ticker: &str, record: StockRecord) -> bool {
        let mut inner = self.inner.lock().expect("aggregator mutex poisoned");
        if !inner.seen.insert(ticker.to_owned()) {
            return false;
        }
        inner.rows.push((ticker.to_owned(), record));
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("aggregator mutex poisoned").rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frozen copy of the accumulated rows in first-success order. Called
    /// after dispatch has stopped; concurrent inserts racing this call land
    /// either fully in or fully out of the snapshot.
    pub fn snapshot(&self) -> Vec<(String, StockRecord)> {
        self.inner
            .lock()
            .expect("aggregator mutex poisoned")
            .rows
            .clone()
    }
}

/// Stable in-place sort by the chosen column. Missing values already coerce
/// to the lowest key inside [`SortColumn::key`], so no row is ever dropped.
pub fn sort_rows(rows: &mut [(String, StockRecord)], column: SortColumn, descending: bool) {
    rows.sort_by(|(_, left), (_, right)| {
        let ordering = column.key(left).cmp(&column.key(right));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
