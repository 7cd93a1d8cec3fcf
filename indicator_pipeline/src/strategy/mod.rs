//! Bar-by-bar signal generation over a merged 5-minute table.
//!
//! A [`Strategy`] sees the bars seen so far and may emit a [`Signal`] for the
//! latest one. Order execution and position accounting are left to whichever
//! engine drives the strategy; [`replay`] only collects the signals.

pub mod cma;
pub mod crossover;
pub mod replay;

use chrono::NaiveDateTime;
use market_data_ingestor::io::dataframe::{f64_values, timestamps};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use cma::{CmaStrategy, MaFilter};
pub use replay::{ReplaySummary, SignalEvent, replay};

use crate::{
    columns::{CLOSE, DATE, HOURLY_CLOSE, NARROW, R4, S4, ma_column},
    errors::{Error, Result},
};

/// Direction of an entry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Long,
    Short,
}

/// The per-bar inputs a strategy reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub narrow: f64,
    pub ma_slow: f64,
    pub ma_fast: f64,
    /// Close of the containing coarse bar.
    pub coarse_close: f64,
    pub r4: f64,
    pub s4: f64,
}

/// Column names [`StrategyBar::from_frame`] reads. Matching ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyColumns {
    pub date: String,
    pub close: String,
    pub narrow: String,
    pub ma_slow: String,
    pub ma_fast: String,
    pub coarse_close: String,
    pub r4: String,
    pub s4: String,
}

impl StrategyColumns {
    pub fn with_windows(slow: usize, fast: usize) -> Self {
        Self {
            ma_slow: ma_column(slow),
            ma_fast: ma_column(fast),
            ..Self::default()
        }
    }
}

impl Default for StrategyColumns {
    fn default() -> Self {
        Self {
            date: DATE.to_string(),
            close: CLOSE.to_string(),
            narrow: NARROW.to_string(),
            ma_slow: ma_column(200),
            ma_fast: ma_column(50),
            coarse_close: HOURLY_CLOSE.to_string(),
            r4: R4.to_string(),
            s4: S4.to_string(),
        }
    }
}

/// Finds `wanted` among the frame's columns, ignoring ASCII case.
fn resolve<'a>(df: &'a DataFrame, wanted: &str) -> Result<&'a str> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .find(|name| name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| Error::MissingColumn(wanted.to_string()))
}

impl StrategyBar {
    /// Extracts one bar per complete row of `df`; rows with a missing input are skipped.
    pub fn from_frame(df: &DataFrame, columns: &StrategyColumns) -> Result<Vec<Self>> {
        let date_name = resolve(df, &columns.date)?;
        let stamps = if date_name == DATE {
            timestamps(df)?
        } else {
            let mut keyed = df.select([date_name])?;
            keyed.rename(date_name, DATE.into())?;
            timestamps(&keyed)?
        };
        let read = |wanted: &str| -> Result<Vec<Option<f64>>> {
            Ok(f64_values(df, resolve(df, wanted)?)?)
        };
        let close = read(&columns.close)?;
        let narrow = read(&columns.narrow)?;
        let ma_slow = read(&columns.ma_slow)?;
        let ma_fast = read(&columns.ma_fast)?;
        let coarse_close = read(&columns.coarse_close)?;
        let r4 = read(&columns.r4)?;
        let s4 = read(&columns.s4)?;

        let bar_at = |row: usize, timestamp: Option<NaiveDateTime>| {
            Some(StrategyBar {
                timestamp: timestamp?,
                close: close[row]?,
                narrow: narrow[row]?,
                ma_slow: ma_slow[row]?,
                ma_fast: ma_fast[row]?,
                coarse_close: coarse_close[row]?,
                r4: r4[row]?,
                s4: s4[row]?,
            })
        };

        let mut bars = Vec::with_capacity(df.height());
        for (row, timestamp) in stamps.into_iter().enumerate() {
            match bar_at(row, timestamp) {
                Some(bar) => bars.push(bar),
                None => debug!(row, "skipping incomplete strategy row"),
            }
        }
        Ok(bars)
    }
}

/// A rule set evaluated once per bar.
pub trait Strategy {
    /// Called with every bar up to and including the newest one.
    fn on_bar(&mut self, history: &[StrategyBar]) -> Option<Signal>;

    fn name(&self) -> &str;

    /// Clears internal state before a new replay.
    fn reset(&mut self) {}
}
