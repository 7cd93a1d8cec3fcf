//! End-to-end processing of one symbol's three tables.
//!
//! 1. Daily: Camarilla levels, then the narrow flag.
//! 2. Hourly: one moving average per configured window.
//! 3. Daily values onto hourly rows (by date), then hourly values (which now
//!    include the daily pivots) onto 5-minute rows (by date and hour).
//! 4. Every table loses its incomplete rows.
//!
//! Each step takes tables by value and returns new ones; nothing is shared.

use indexmap::{IndexMap, IndexSet};
use market_data_ingestor::models::{bar_series::BarSeries, granularity::Granularity};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use crate::{
    errors::{Error, Result},
    indicators::{IndicatorSet, with_indicators},
    io::sink::TableSink,
    merge::{MergePlan, MergeReport, merge_coarse},
    prune::{PruneReport, prune_incomplete},
};

pub const DEFAULT_MA_WINDOWS: [usize; 2] = [200, 50];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub ma_windows: Vec<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            ma_windows: DEFAULT_MA_WINDOWS.to_vec(),
        }
    }
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<()> {
        if let Some(&window) = self.ma_windows.iter().find(|&&w| w == 0) {
            return Err(Error::InvalidWindow(window));
        }
        Ok(())
    }
}

/// The three tables of one symbol.
#[derive(Debug, Clone)]
pub struct SymbolTables {
    pub symbol: String,
    pub daily: DataFrame,
    pub hourly: DataFrame,
    pub five_minute: DataFrame,
}

impl SymbolTables {
    pub fn tables_mut(&mut self) -> [(Granularity, &mut DataFrame); 3] {
        [
            (Granularity::Daily, &mut self.daily),
            (Granularity::Hourly, &mut self.hourly),
            (Granularity::FiveMinute, &mut self.five_minute),
        ]
    }
}

/// Regroups fetched series, keyed by granularity, into one [`SymbolTables`]
/// per symbol.
///
/// Symbols keep the order in which they first appear. A symbol must be
/// present at all three granularities.
pub fn group_by_symbol(
    fetched: IndexMap<Granularity, Vec<BarSeries>>,
) -> Result<Vec<SymbolTables>> {
    let mut by_granularity: IndexMap<Granularity, IndexMap<String, BarSeries>> = fetched
        .into_iter()
        .map(|(granularity, series)| {
            let by_symbol = series.into_iter().map(|s| (s.symbol.clone(), s)).collect();
            (granularity, by_symbol)
        })
        .collect();

    let symbols: IndexSet<String> = by_granularity
        .values()
        .flat_map(|by_symbol| by_symbol.keys().cloned())
        .collect();

    let mut frame = |symbol: &str, granularity: Granularity| -> Result<DataFrame> {
        let series = by_granularity
            .get_mut(&granularity)
            .and_then(|by_symbol| by_symbol.shift_remove(symbol))
            .ok_or_else(|| Error::MissingSeries {
                symbol: symbol.to_string(),
                granularity,
            })?;
        Ok(series.to_frame()?)
    };

    symbols
        .into_iter()
        .map(|symbol| {
            Ok(SymbolTables {
                daily: frame(&symbol, Granularity::Daily)?,
                hourly: frame(&symbol, Granularity::Hourly)?,
                five_minute: frame(&symbol, Granularity::FiveMinute)?,
                symbol,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub symbol: String,
    pub daily_into_hourly: MergeReport,
    pub hourly_into_five_minute: MergeReport,
    pub daily: PruneReport,
    pub hourly: PruneReport,
    pub five_minute: PruneReport,
}

/// Runs every stage over one symbol.
pub fn run_symbol(
    tables: SymbolTables,
    settings: &PipelineSettings,
) -> Result<(SymbolTables, PipelineReport)> {
    settings.validate()?;
    let SymbolTables {
        symbol,
        daily,
        hourly,
        five_minute,
    } = tables;
    let _span = info_span!("pipeline", symbol = %symbol).entered();

    let daily = with_indicators(daily, &IndicatorSet::pivots())?;
    let hourly = with_indicators(hourly, &IndicatorSet::moving_averages(&settings.ma_windows))?;

    let (hourly, daily_into_hourly) =
        merge_coarse(hourly, &daily, &MergePlan::daily_into_hourly())?;
    let (five_minute, hourly_into_five_minute) = merge_coarse(
        five_minute,
        &hourly,
        &MergePlan::hourly_into_five_minute(&settings.ma_windows),
    )?;

    let (daily, daily_pruned) = prune_incomplete(daily)?;
    let (hourly, hourly_pruned) = prune_incomplete(hourly)?;
    let (five_minute, five_minute_pruned) = prune_incomplete(five_minute)?;

    info!(
        daily = daily.height(),
        hourly = hourly.height(),
        five_minute = five_minute.height(),
        "pipeline finished"
    );

    let report = PipelineReport {
        symbol: symbol.clone(),
        daily_into_hourly,
        hourly_into_five_minute,
        daily: daily_pruned,
        hourly: hourly_pruned,
        five_minute: five_minute_pruned,
    };
    Ok((
        SymbolTables {
            symbol,
            daily,
            hourly,
            five_minute,
        },
        report,
    ))
}

/// Runs [`run_symbol`] for every symbol in order, stopping at the first failure.
pub fn run_all(
    symbols: Vec<SymbolTables>,
    settings: &PipelineSettings,
) -> Result<Vec<(SymbolTables, PipelineReport)>> {
    symbols
        .into_iter()
        .map(|tables| run_symbol(tables, settings))
        .collect()
}

/// Hands all three tables of `tables` to `sink`.
pub fn persist<S: TableSink>(
    sink: &S,
    tables: &mut SymbolTables,
    period: &str,
) -> Result<Vec<S::Output>> {
    let symbol = tables.symbol.clone();
    tables
        .tables_mut()
        .into_iter()
        .map(|(granularity, table)| sink.write(&symbol, granularity, period, table))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use market_data_ingestor::models::bar::Bar;

    use super::*;

    fn series(symbol: &str, granularity: Granularity, bars: usize) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2019, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let bars = (0..bars)
            .map(|i| Bar {
                timestamp: start + chrono::Duration::hours(i as i64),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 10.0,
            })
            .collect();
        BarSeries::new(symbol, granularity, bars)
    }

    fn fetched(symbols: &[&str]) -> IndexMap<Granularity, Vec<BarSeries>> {
        Granularity::ALL
            .into_iter()
            .enumerate()
            .map(|(i, g)| (g, symbols.iter().map(|s| series(s, g, i + 1)).collect()))
            .collect()
    }

    #[test]
    fn series_are_regrouped_per_symbol() {
        let tables = group_by_symbol(fetched(&["SPY", "QQQ"])).unwrap();

        let symbols: Vec<&str> = tables.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SPY", "QQQ"]);
        for table in &tables {
            assert_eq!(table.daily.height(), 1);
            assert_eq!(table.hourly.height(), 2);
            assert_eq!(table.five_minute.height(), 3);
        }
    }

    #[test]
    fn symbol_missing_one_granularity_is_an_error() {
        let mut fetched = fetched(&["SPY", "QQQ"]);
        fetched[&Granularity::Hourly].retain(|s| s.symbol != "QQQ");

        let err = group_by_symbol(fetched).unwrap_err();
        assert!(matches!(
            &err,
            Error::MissingSeries { symbol, granularity: Granularity::Hourly } if symbol == "QQQ"
        ));
        assert_eq!(err.to_string(), "No hourly bars returned for QQQ");
    }

    #[test]
    fn nothing_fetched_gives_no_tables() {
        assert!(group_by_symbol(IndexMap::new()).unwrap().is_empty());
    }

    #[test]
    fn zero_window_fails_before_any_work() {
        let settings = PipelineSettings {
            ma_windows: vec![50, 0],
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidWindow(0))));
        assert!(PipelineSettings::default().validate().is_ok());
    }
}
