use thiserror::Error;

use crate::providers::ProviderError;

/// The unified error type for the `market_data_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from a data provider (e.g., API error, validation).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required column is absent from a frame.
    #[error("Missing column `{0}`")]
    MissingColumn(String),

    /// A key cell could not be read as a timestamp.
    #[error("Invalid timestamp `{0}`")]
    InvalidTimestamp(String),

    /// A bar field is null where a value is required.
    #[error("Null `{column}` at row {row}")]
    NullValue { column: String, row: usize },

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// An error from the Polars library.
    #[error("Polars operation failed")]
    Polars(#[from] polars::prelude::PolarsError),
}
