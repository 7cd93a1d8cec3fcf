//! Copies coarse-granularity values onto the finer rows they contain.
//!
//! The coarse table is indexed once by alignment key, every fine row is
//! mapped to `Option<coarse row>`, and each planned column is gathered through
//! that mapping in a single `take`. Unmatched fine rows receive nulls.

use std::collections::HashMap;

use market_data_ingestor::{io::dataframe::timestamps, models::granularity::Granularity};
use polars::prelude::*;
use tracing::{info, warn};

use crate::{
    columns::{CAMARILLA, CLOSE, DAILY_CLOSE, DATE, HOURLY_CLOSE, NARROW, ma_column, require},
    errors::{Error, Result},
    keys::{CoarseKey, KeyKind},
};

/// One column copied from the coarse table, renamed on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCopy {
    pub source: String,
    pub target: String,
}

impl ColumnCopy {
    pub fn renamed(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    pub fn same(name: &str) -> Self {
        Self::renamed(name, name)
    }
}

/// What to copy from a coarse table into a fine one and how rows align.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub coarse: Granularity,
    pub fine: Granularity,
    pub key: KeyKind,
    pub columns: Vec<ColumnCopy>,
}

impl MergePlan {
    fn pivots(coarse: Granularity, fine: Granularity, key: KeyKind, close_as: &str) -> Self {
        let mut columns = vec![ColumnCopy::renamed(CLOSE, close_as)];
        columns.extend(CAMARILLA.iter().map(|name| ColumnCopy::same(name)));
        columns.push(ColumnCopy::same(NARROW));
        Self {
            coarse,
            fine,
            key,
            columns,
        }
    }

    /// Daily close, Camarilla levels and narrow flag onto hourly rows by date.
    pub fn daily_into_hourly() -> Self {
        Self::pivots(Granularity::Daily, Granularity::Hourly, KeyKind::Date, DAILY_CLOSE)
    }

    /// Hourly close, the (daily) pivots already merged into the hourly table,
    /// and its moving averages onto 5-minute rows by date and hour.
    pub fn hourly_into_five_minute(ma_windows: &[usize]) -> Self {
        let mut plan = Self::pivots(
            Granularity::Hourly,
            Granularity::FiveMinute,
            KeyKind::Hour,
            HOURLY_CLOSE,
        );
        plan.columns
            .extend(ma_windows.iter().map(|&w| ColumnCopy::same(&ma_column(w))));
        plan
    }
}

/// Row counts of one merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub fine_rows: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
}

fn index_coarse(coarse: &DataFrame, kind: KeyKind) -> Result<HashMap<CoarseKey, IdxSize>> {
    let stamps = timestamps(coarse)?;
    let mut index = HashMap::with_capacity(stamps.len());

    for (row, ts) in stamps.into_iter().enumerate() {
        let Some(ts) = ts else { continue };
        let key = kind.key_of(ts);
        if let Some(&first) = index.get(&key) {
            return Err(Error::DuplicateCoarseKey {
                key: key.to_string(),
                first: first as usize,
                second: row,
            });
        }
        index.insert(key, row as IdxSize);
    }
    Ok(index)
}

/// Attaches the planned coarse columns to `fine`.
///
/// Target columns already present on `fine` are replaced, so merging the same
/// pair twice gives the same table.
pub fn merge_coarse(
    mut fine: DataFrame,
    coarse: &DataFrame,
    plan: &MergePlan,
) -> Result<(DataFrame, MergeReport)> {
    let sources: Vec<&str> = plan.columns.iter().map(|c| c.source.as_str()).collect();
    require(coarse, &sources)?;
    require(&fine, &[DATE])?;
    info!(
        from = %plan.coarse,
        into = %plan.fine,
        "merging {} into {}",
        plan.coarse.label(),
        plan.fine.label()
    );

    let index = index_coarse(coarse, plan.key)?;
    let mapping: Vec<Option<IdxSize>> = timestamps(&fine)?
        .into_iter()
        .map(|ts| ts.and_then(|ts| index.get(&plan.key.key_of(ts)).copied()))
        .collect();

    let matched_rows = mapping.iter().filter(|m| m.is_some()).count();
    let report = MergeReport {
        fine_rows: mapping.len(),
        matched_rows,
        unmatched_rows: mapping.len() - matched_rows,
    };

    let take = IdxCa::from_iter_options("take".into(), mapping.into_iter());
    for copy in &plan.columns {
        let gathered = coarse
            .column(&copy.source)?
            .as_materialized_series()
            .take(&take)?
            .with_name(copy.target.as_str().into());
        fine.with_column(gathered)?;
    }

    if report.fine_rows > 0 && report.matched_rows == 0 {
        warn!(
            rows = report.fine_rows,
            "no {} row matched any {} row",
            plan.fine.label(),
            plan.coarse.label()
        );
    }
    info!(
        matched = report.matched_rows,
        unmatched = report.unmatched_rows,
        "merged {} columns",
        plan.columns.len()
    );
    Ok((fine, report))
}

#[cfg(test)]
mod tests {
    use market_data_ingestor::io::dataframe::{date_series, parse_timestamp};

    use super::*;

    fn frame(stamps: &[&str], close: &[f64]) -> DataFrame {
        let dates = date_series(stamps.iter().map(|s| parse_timestamp(s).unwrap())).unwrap();
        DataFrame::new(vec![
            dates.into_column(),
            Column::new(CLOSE.into(), close.to_vec()),
        ])
        .unwrap()
    }

    fn close_only(key: KeyKind, target: &str) -> MergePlan {
        MergePlan {
            coarse: Granularity::Daily,
            fine: Granularity::Hourly,
            key,
            columns: vec![ColumnCopy::renamed(CLOSE, target)],
        }
    }

    fn f64s(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn fine_rows_take_their_day() {
        let daily = frame(&["2019-01-02", "2019-01-03"], &[100.0, 101.0]);
        let hourly = frame(
            &[
                "2019-01-02 09:00:00",
                "2019-01-02 10:00:00",
                "2019-01-03 09:00:00",
                "2019-01-04 09:00:00",
            ],
            &[1.0, 2.0, 3.0, 4.0],
        );

        let (merged, report) =
            merge_coarse(hourly, &daily, &close_only(KeyKind::Date, DAILY_CLOSE)).unwrap();

        assert_eq!(
            f64s(&merged, DAILY_CLOSE),
            vec![Some(100.0), Some(100.0), Some(101.0), None]
        );
        assert_eq!(f64s(&merged, CLOSE), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(
            report,
            MergeReport {
                fine_rows: 4,
                matched_rows: 3,
                unmatched_rows: 1
            }
        );
    }

    #[test]
    fn five_minute_rows_take_their_hour() {
        let hourly = frame(&["2019-01-02 09:00:00", "2019-01-02 10:00:00"], &[10.0, 11.0]);
        let five = frame(
            &["2019-01-02 09:00:00", "2019-01-02 09:55:00", "2019-01-02 10:05:00"],
            &[1.0, 2.0, 3.0],
        );

        let (merged, _) =
            merge_coarse(five, &hourly, &close_only(KeyKind::Hour, HOURLY_CLOSE)).unwrap();

        assert_eq!(f64s(&merged, HOURLY_CLOSE), vec![Some(10.0), Some(10.0), Some(11.0)]);
    }

    #[test]
    fn duplicate_coarse_keys_are_rejected() {
        let coarse = frame(&["2019-01-02 09:00:00", "2019-01-02 15:00:00"], &[1.0, 2.0]);
        let fine = frame(&["2019-01-02 09:00:00"], &[1.0]);

        let err = merge_coarse(fine, &coarse, &close_only(KeyKind::Date, DAILY_CLOSE)).unwrap_err();
        assert!(matches!(err, Error::DuplicateCoarseKey { first: 0, second: 1, .. }));
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let daily = frame(&["2019-01-02"], &[100.0]);
        let hourly = frame(&["2019-01-02 09:00:00", "2019-01-05 09:00:00"], &[1.0, 2.0]);
        let plan = close_only(KeyKind::Date, DAILY_CLOSE);

        let (once, _) = merge_coarse(hourly, &daily, &plan).unwrap();
        let (twice, _) = merge_coarse(once.clone(), &daily, &plan).unwrap();

        assert!(once.equals_missing(&twice));
        assert_eq!(twice.width(), 3);
    }

    #[test]
    fn plans_list_expected_columns() {
        let plan = MergePlan::hourly_into_five_minute(&[200, 50]);
        let targets: Vec<&str> = plan.columns.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(
            targets,
            vec![HOURLY_CLOSE, "R4", "R3", "S3", "S4", NARROW, "MA 200", "MA 50"]
        );
        assert_eq!(MergePlan::daily_into_hourly().key, KeyKind::Date);
    }

    #[test]
    fn missing_source_column_is_reported() {
        let daily = frame(&["2019-01-02"], &[100.0]);
        let hourly = frame(&["2019-01-02 09:00:00"], &[1.0]);
        let err = merge_coarse(hourly, &daily, &MergePlan::daily_into_hourly()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "R4"));
    }
}
