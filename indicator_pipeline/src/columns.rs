//! Column names shared by every stage.

pub use market_data_ingestor::io::dataframe::{CLOSE, DATE, HIGH, LOW, OPEN, VOLUME};
use polars::prelude::DataFrame;

use crate::errors::{Error, Result};

pub const R4: &str = "R4";
pub const R3: &str = "R3";
pub const S3: &str = "S3";
pub const S4: &str = "S4";
pub const NARROW: &str = "narrow";

/// Camarilla levels in the order they are appended.
pub const CAMARILLA: [&str; 4] = [R4, R3, S3, S4];

pub const DAILY_CLOSE: &str = "daily close";
pub const HOURLY_CLOSE: &str = "hourly close";

/// Name of the moving-average column for `window` (`"MA 50"`).
pub fn ma_column(window: usize) -> String {
    format!("MA {window}")
}

/// Fails with [`Error::MissingColumn`] naming the first absent column.
pub fn require(df: &DataFrame, names: &[&str]) -> Result<()> {
    match names.iter().find(|name| df.get_column_index(name).is_none()) {
        Some(missing) => Err(Error::MissingColumn((*missing).to_string())),
        None => Ok(()),
    }
}
