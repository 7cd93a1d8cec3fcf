use std::{
    fs::{self, File},
    path::Path,
};

use market_data_ingestor::io::dataframe::{TIMESTAMP_FORMAT, normalize_frame};
use polars::prelude::*;
use tracing::debug;

use crate::errors::Result;

/// Reads a CSV table into canonical shape (`date` key, ascending, `Float64` OHLCV).
///
/// Accepts both persisted tables and raw provider downloads keyed by `timestamp`.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = df.height(), "read table");
    Ok(normalize_frame(df)?)
}

/// Writes `df` with a header row, creating parent directories as needed.
pub fn write_table(path: &Path, df: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_datetime_format(Some(TIMESTAMP_FORMAT.to_string()))
        .finish(df)?;
    debug!(path = %path.display(), rows = df.height(), "wrote table");
    Ok(())
}
