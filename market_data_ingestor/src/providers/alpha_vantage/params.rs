use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{
    models::{granularity::Granularity, request_params::BarsRequestParams},
    providers::{ProviderError, ValidationSnafu},
};

/// How much history a single call returns.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    /// Latest 100 data points.
    Compact,
    #[default]
    Full,
}

impl OutputSize {
    fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

/// Alpha Vantage-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AlphaVantageParams {
    #[serde(default)]
    pub output_size: OutputSize,
    /// Split/dividend adjusted intraday prices (provider default: true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted: Option<bool>,
    /// Include pre- and post-market intraday bars (provider default: true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_hours: Option<bool>,
}

/// Rejects requests the endpoint cannot answer.
pub fn validate_request(params: &BarsRequestParams) -> Result<(), ProviderError> {
    ensure!(
        !params.symbols.is_empty(),
        ValidationSnafu {
            message: "at least one symbol is required"
        }
    );
    ensure!(
        params.symbols.iter().all(|s| !s.trim().is_empty()),
        ValidationSnafu {
            message: "symbols must not be blank"
        }
    );
    ensure!(
        params.start_year <= params.end_year,
        ValidationSnafu {
            message: format!(
                "start year {} is after end year {}",
                params.start_year, params.end_year
            )
        }
    );
    Ok(())
}

/// Builds the query for one call, without the API key.
///
/// `month` is required for intraday granularities and ignored for daily bars.
pub fn construct_params(
    symbol: &str,
    granularity: Granularity,
    month: Option<(i32, u32)>,
    extra: &AlphaVantageParams,
) -> Vec<(String, String)> {
    let mut query = Vec::with_capacity(8);

    match granularity.intraday_interval() {
        None => {
            query.push(("function".to_string(), "TIME_SERIES_DAILY".to_string()));
            query.push(("symbol".to_string(), symbol.to_string()));
        }
        Some(interval) => {
            query.push(("function".to_string(), "TIME_SERIES_INTRADAY".to_string()));
            query.push(("symbol".to_string(), symbol.to_string()));
            query.push(("interval".to_string(), interval.to_string()));
            if let Some((year, month)) = month {
                query.push(("month".to_string(), format!("{year}-{month:02}")));
            }
            if let Some(adjusted) = extra.adjusted {
                query.push(("adjusted".to_string(), adjusted.to_string()));
            }
            if let Some(extended) = extra.extended_hours {
                query.push(("extended_hours".to_string(), extended.to_string()));
            }
        }
    }

    query.push(("outputsize".to_string(), extra.output_size.as_str().to_string()));
    query.push(("datatype".to_string(), "csv".to_string()));
    query
}
