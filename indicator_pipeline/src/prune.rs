//! Drops rows that carry any missing value.
//!
//! Missing means null in any column, or NaN in a float column. Rows lacking
//! history (leading indicator nulls) and rows without a coarse match both end
//! up here.

use polars::prelude::*;
use tracing::info;

use crate::errors::Result;

/// Row counts before and after pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub before: usize,
    pub after: usize,
}

impl PruneReport {
    pub fn dropped(&self) -> usize {
        self.before - self.after
    }
}

fn complete_rows(df: &DataFrame) -> Result<Vec<bool>> {
    let mut keep = vec![true; df.height()];

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if series.dtype().is_float() {
            let values = series.cast(&DataType::Float64)?;
            for (flag, value) in keep.iter_mut().zip(values.f64()?.into_iter()) {
                *flag &= value.is_some_and(|v| !v.is_nan());
            }
        } else if series.null_count() > 0 {
            let nulls = series.is_null();
            for (flag, is_null) in keep.iter_mut().zip(nulls.into_iter()) {
                *flag &= !is_null.unwrap_or(true);
            }
        }
    }
    Ok(keep)
}

/// Returns `df` without its incomplete rows.
pub fn prune_incomplete(df: DataFrame) -> Result<(DataFrame, PruneReport)> {
    let before = df.height();
    info!(rows = before, "dropping incomplete rows");

    let keep = complete_rows(&df)?;
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let pruned = df.filter(&mask)?;

    let report = PruneReport {
        before,
        after: pruned.height(),
    };
    info!(dropped = report.dropped(), remaining = report.after, "pruned table");
    Ok((pruned, report))
}
