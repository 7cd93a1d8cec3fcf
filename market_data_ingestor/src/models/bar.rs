//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is used as the standard output for all
//! [`DataProvider`](crate::providers::DataProvider) implementations.

use chrono::NaiveDateTime;

/// A single time-series bar (OHLCV) for a given timestamp.
///
/// The timestamp is the provider's wall-clock value. No timezone conversion
/// is applied anywhere in the pipeline, so calendar keys are derived from its
/// literal date and hour.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// The timestamp for this bar, exchange-local wall clock.
    pub timestamp: NaiveDateTime,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,
}
