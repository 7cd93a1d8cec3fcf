//! Indicator columns appended to an OHLC table.
//!
//! Every value at row `t` is computed from rows strictly before `t`: the
//! Camarilla levels and the moving averages read the previous row through a
//! one-period shift, and `narrow` compares those already-lagged levels with
//! the row before them.

use polars::prelude::*;
use tracing::info;

use crate::{
    columns::{CAMARILLA, CLOSE, HIGH, LOW, NARROW, R3, R4, S3, S4, ma_column, require},
    errors::{Error, Result},
};

const OUTER: f64 = 0.55;
const INNER: f64 = 0.275;

fn previous(name: &str) -> Expr {
    col(name).cast(DataType::Float64).shift(lit(1i64))
}

/// Appends `R4`, `R3`, `S3`, `S4` computed from the previous row.
///
/// The first row has no predecessor and gets nulls.
pub fn with_camarilla(df: DataFrame) -> Result<DataFrame> {
    require(&df, &[HIGH, LOW, CLOSE])?;
    info!(rows = df.height(), "adding camarilla indicator");

    let range = previous(HIGH) - previous(LOW);
    let level = |factor: f64| previous(CLOSE) + range.clone() * lit(factor);

    Ok(df
        .lazy()
        .with_columns([
            level(OUTER).alias(R4),
            level(INNER).alias(R3),
            level(-INNER).alias(S3),
            level(-OUTER).alias(S4),
        ])
        .collect()?)
}

/// Appends the `narrow` flag: 1 when today's Camarilla band sits strictly
/// inside yesterday's, 0 otherwise (including when either is unknown).
pub fn with_narrow(df: DataFrame) -> Result<DataFrame> {
    require(&df, &CAMARILLA)?;
    info!(rows = df.height(), "adding narrow indicator");

    let prior = |name: &str| col(name).shift(lit(1i64));
    let inside = prior(R4)
        .gt(col(R4))
        .and(prior(R3).gt(col(R3)))
        .and(prior(S4).lt(col(S4)))
        .and(prior(S3).lt(col(S3)));

    Ok(df
        .lazy()
        .with_column(
            when(inside.fill_null(lit(false)))
                .then(lit(1i32))
                .otherwise(lit(0i32))
                .cast(DataType::Int32)
                .alias(NARROW),
        )
        .collect()?)
}

/// Appends `MA {window}`: the mean of the `window` closes before each row.
///
/// Rows with fewer than `window` predecessors get nulls.
pub fn with_moving_average(df: DataFrame, window: usize) -> Result<DataFrame> {
    if window == 0 {
        return Err(Error::InvalidWindow(window));
    }
    require(&df, &[CLOSE])?;
    let name = ma_column(window);
    info!(rows = df.height(), column = %name, "adding moving average");

    let options = RollingOptionsFixedWindow {
        window_size: window,
        min_periods: window,
        ..Default::default()
    };

    Ok(df
        .lazy()
        .with_column(previous(CLOSE).rolling_mean(options).alias(name.as_str()))
        .collect()?)
}

/// Which indicators a table should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSet {
    pub camarilla: bool,
    /// Requires `camarilla`.
    pub narrow: bool,
    pub ma_windows: Vec<usize>,
}

impl IndicatorSet {
    /// Camarilla levels plus the narrow flag, as computed on daily bars.
    pub fn pivots() -> Self {
        Self {
            camarilla: true,
            narrow: true,
            ma_windows: Vec::new(),
        }
    }

    pub fn moving_averages(windows: &[usize]) -> Self {
        Self {
            camarilla: false,
            narrow: false,
            ma_windows: windows.to_vec(),
        }
    }
}

/// Applies every indicator of `set`, pivots first.
pub fn with_indicators(mut df: DataFrame, set: &IndicatorSet) -> Result<DataFrame> {
    if set.camarilla {
        df = with_camarilla(df)?;
    }
    if set.narrow {
        df = with_narrow(df)?;
    }
    for &window in &set.ma_windows {
        df = with_moving_average(df, window)?;
    }
    Ok(df)
}
