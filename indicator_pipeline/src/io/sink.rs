use std::path::{Path, PathBuf};

use market_data_ingestor::models::granularity::Granularity;
use polars::prelude::DataFrame;
use tracing::info;

use super::csv::write_table;
use crate::errors::Result;

/// `{root}/{granularity dir}/{SYMBOL}_{period}`.
pub fn table_path(root: &Path, granularity: Granularity, symbol: &str, period: &str) -> PathBuf {
    root.join(granularity.storage_dir())
        .join(format!("{}_{period}", symbol.to_uppercase()))
}

/// A destination for finished tables.
pub trait TableSink {
    /// What a successful write yields, e.g. the path of the created file.
    type Output;

    fn write(
        &self,
        symbol: &str,
        granularity: Granularity,
        period: &str,
        table: &mut DataFrame,
    ) -> Result<Self::Output>;
}

/// Writes one CSV file per table under a root directory.
#[derive(Debug, Clone)]
pub struct CsvTableSink {
    root: PathBuf,
}

impl CsvTableSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TableSink for CsvTableSink {
    type Output = PathBuf;

    fn write(
        &self,
        symbol: &str,
        granularity: Granularity,
        period: &str,
        table: &mut DataFrame,
    ) -> Result<PathBuf> {
        let path = table_path(&self.root, granularity, symbol, period);
        write_table(&path, table)?;
        info!(path = %path.display(), rows = table.height(), "saved {} table", granularity.label());
        Ok(path)
    }
}
