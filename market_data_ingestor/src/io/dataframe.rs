//! Conversion between [`BarSeries`] and Polars frames.
//!
//! Every frame leaving this module has a `date` key column of type
//! `Datetime(ms)` without a time zone, sorted ascending, and `Float64`
//! OHLCV columns.

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::{
    errors::Error,
    models::{bar::Bar, bar_series::BarSeries, granularity::Granularity},
};

/// Row key column of every table.
pub const DATE: &str = "date";
/// Key column name used by provider CSV responses.
pub const TIMESTAMP: &str = "timestamp";
pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";

pub const OHLCV: [&str; 5] = [OPEN, HIGH, LOW, CLOSE, VOLUME];

/// Format used when persisting the key column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Logical type of the `date` column.
pub fn date_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// Parses a provider or persisted timestamp. A bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Builds a `date` series from wall-clock timestamps.
pub fn date_series(timestamps: impl IntoIterator<Item = NaiveDateTime>) -> PolarsResult<Series> {
    let millis: Vec<i64> = timestamps
        .into_iter()
        .map(|ts| ts.and_utc().timestamp_millis())
        .collect();
    Series::new(DATE.into(), millis).cast(&date_dtype())
}

/// Reads the `date` column back as wall-clock timestamps.
pub fn timestamps(df: &DataFrame) -> Result<Vec<Option<NaiveDateTime>>, Error> {
    let column = df
        .column(DATE)
        .map_err(|_| Error::MissingColumn(DATE.to_string()))?;
    let dates = column.as_materialized_series().datetime()?;
    Ok(dates.as_datetime_iter().collect())
}

/// Reads any numeric column as `f64`, nulls preserved.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, Error> {
    let column = df
        .column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Brings a freshly read frame into canonical shape.
///
/// - `timestamp` is renamed to `date` when `date` is absent.
/// - String keys are parsed with [`parse_timestamp`]; temporal keys are cast.
/// - OHLCV columns present in the frame are cast to `Float64`.
/// - Rows are sorted ascending by `date` (providers answer newest first).
pub fn normalize_frame(mut df: DataFrame) -> Result<DataFrame, Error> {
    if df.get_column_index(DATE).is_none() {
        if df.get_column_index(TIMESTAMP).is_none() {
            return Err(Error::MissingColumn(DATE.to_string()));
        }
        df.rename(TIMESTAMP, DATE.into())?;
    }

    let key = df.column(DATE)?.as_materialized_series().clone();
    let key = match key.dtype() {
        DataType::String => {
            let mut parsed = Vec::with_capacity(key.len());
            for raw in key.str()?.into_iter() {
                let raw = raw.ok_or_else(|| Error::InvalidTimestamp("<null>".to_string()))?;
                let ts = parse_timestamp(raw)
                    .ok_or_else(|| Error::InvalidTimestamp(raw.to_string()))?;
                parsed.push(ts);
            }
            date_series(parsed)?
        }
        _ => key.cast(&date_dtype())?,
    };
    df.with_column(key)?;

    for name in OHLCV {
        if df.get_column_index(name).is_some() {
            let cast = df
                .column(name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            df.with_column(cast)?;
        }
    }

    Ok(df.sort([DATE], SortMultipleOptions::default())?)
}

/// Parses a CSV payload (provider response or file contents) into a canonical frame.
pub fn frame_from_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame, Error> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    normalize_frame(df)
}

impl BarSeries {
    /// Converts the series into an OHLC table (`date`, `open`, `high`, `low`, `close`, `volume`).
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let field = |f: fn(&Bar) -> f64| self.bars.iter().map(f).collect::<Vec<f64>>();

        DataFrame::new(vec![
            date_series(self.bars.iter().map(|b| b.timestamp))?.into_column(),
            Column::new(OPEN.into(), field(|b| b.open)),
            Column::new(HIGH.into(), field(|b| b.high)),
            Column::new(LOW.into(), field(|b| b.low)),
            Column::new(CLOSE.into(), field(|b| b.close)),
            Column::new(VOLUME.into(), field(|b| b.volume)),
        ])
    }

    /// Rebuilds a series from an OHLC table. A missing `volume` column reads as zero.
    pub fn from_frame(
        symbol: impl Into<String>,
        granularity: Granularity,
        df: &DataFrame,
    ) -> Result<Self, Error> {
        let stamps = timestamps(df)?;
        let open = f64_values(df, OPEN)?;
        let high = f64_values(df, HIGH)?;
        let low = f64_values(df, LOW)?;
        let close = f64_values(df, CLOSE)?;
        let volume = match df.get_column_index(VOLUME) {
            Some(_) => f64_values(df, VOLUME)?,
            None => vec![Some(0.0); df.height()],
        };

        let required = |values: &[Option<f64>], column: &str, row: usize| {
            values[row].ok_or_else(|| Error::NullValue {
                column: column.to_string(),
                row,
            })
        };

        let mut bars = Vec::with_capacity(df.height());
        for (row, ts) in stamps.into_iter().enumerate() {
            let timestamp = ts.ok_or_else(|| Error::NullValue {
                column: DATE.to_string(),
                row,
            })?;
            bars.push(Bar {
                timestamp,
                open: required(&open, OPEN, row)?,
                high: required(&high, HIGH, row)?,
                low: required(&low, LOW, row)?,
                close: required(&close, CLOSE, row)?,
                volume: volume[row].unwrap_or(0.0),
            });
        }

        Ok(BarSeries::new(symbol, granularity, bars))
    }
}
