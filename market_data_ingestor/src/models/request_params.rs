use serde::{Deserialize, Serialize};

use crate::{models::granularity::Granularity, providers::alpha_vantage::AlphaVantageParams};

/// Universal parameters for requesting time-series bar data from a market data provider.
///
/// Intraday providers page by calendar month, so the range is expressed as an
/// inclusive span of years, matching how extraction runs are named
/// (`SPY_2016-2018`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// List of symbols to request (e.g., `["SPY"]`).
    pub symbols: Vec<String>,

    /// The resolution of the requested bars.
    pub granularity: Granularity,

    /// First calendar year to fetch (inclusive).
    pub start_year: i32,

    /// Last calendar year to fetch (inclusive).
    pub end_year: i32,

    /// Optional, provider-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

impl BarsRequestParams {
    /// Every `(year, month)` covered by the request, oldest first.
    pub fn months(&self) -> Vec<(i32, u32)> {
        (self.start_year..=self.end_year)
            .flat_map(|year| (1..=12).map(move |month| (year, month)))
            .collect()
    }
}

/// An enum to hold provider-specific request parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    AlphaVantage(AlphaVantageParams),
}
