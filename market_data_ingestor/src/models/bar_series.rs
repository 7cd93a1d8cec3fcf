//! A collection of time-series bars for a specific symbol and granularity.

use crate::models::{bar::Bar, granularity::Granularity};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`Granularity`], making the data set self-describing.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "SPY", "AAPL").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub granularity: Granularity,
    /// The collection of OHLCV bars, oldest first.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, granularity: Granularity, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            granularity,
            bars,
        }
    }

    /// Appends `other` and restores ascending, duplicate-free timestamp order.
    ///
    /// Monthly intraday pages can overlap at their edges; the later page wins.
    pub fn extend_sorted(&mut self, other: Vec<Bar>) {
        self.bars.extend(other);
        self.bars.sort_by_key(|bar| bar.timestamp);
        self.bars.reverse();
        self.bars.dedup_by_key(|bar| bar.timestamp);
        self.bars.reverse();
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
