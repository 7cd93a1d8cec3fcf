use market_data_ingestor::models::granularity::Granularity;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while building, merging or evaluating indicator tables.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stage needs a column the table does not have.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Moving average window must be positive, got {0}")]
    InvalidWindow(usize),

    /// Two coarse rows map to the same alignment key.
    #[error("Duplicate coarse key {key} at rows {first} and {second}")]
    DuplicateCoarseKey {
        key: String,
        first: usize,
        second: usize,
    },

    /// A symbol was returned at some granularities but not at this one.
    #[error("No {} bars returned for {symbol}", .granularity.label())]
    MissingSeries {
        symbol: String,
        granularity: Granularity,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error(transparent)]
    Ingestor(#[from] market_data_ingestor::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
